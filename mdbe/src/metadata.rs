///
/// Descriptive metadata.
///
/// Read-only views over already collected type information: the decoded
/// columns of a cursor, or the descriptors a prepare call returned. Nothing
/// here calls into the engine. Indexes are 1-based.
///

use crate::column::Column;
use crate::error::{Error, Result};
use crate::native::{ColumnDescriptor, TypeDescriptor};
use crate::types::{EngineType, SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    NoNulls,
    Nullable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    In,
}

/// Decimal digits a code can carry when the engine reports none.
fn default_precision(ty: EngineType) -> u32 {
    match ty {
        EngineType::Bool => 1,
        EngineType::Int8 => 3,
        EngineType::Int16 => 5,
        EngineType::Int32 | EngineType::Size => 10,
        EngineType::Int64 => 19,
        EngineType::Int128 => 39,
        EngineType::Float => 7,
        EngineType::Double => 15,
        EngineType::Date => 10,
        EngineType::Time => 8,
        EngineType::Timestamp => 26,
        EngineType::Str | EngineType::Blob | EngineType::Unknown => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeInfo {
    engine_type: EngineType,
    digits: u32,
    scale: u32,
}

impl TypeInfo {
    fn from_descriptor(ty: &TypeDescriptor) -> Self {
        let engine_type = EngineType::from_code(ty.code).unwrap_or(EngineType::Unknown);
        let digits = if ty.digits > 0 {
            ty.digits
        } else {
            default_precision(engine_type)
        };
        Self {
            engine_type,
            digits,
            scale: ty.scale,
        }
    }

    fn relational_type(&self) -> SqlType {
        match self.engine_type.relational_type() {
            SqlType::Integer | SqlType::BigInt | SqlType::SmallInt | SqlType::TinyInt
                if self.scale > 0 =>
            {
                SqlType::Decimal
            }
            other => other,
        }
    }
}

fn checked<'a, T>(items: &'a [T], index: usize, what: &'static str) -> Result<&'a T> {
    index
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or(Error::Range {
            what,
            index: index as i64,
            count: items.len(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    name: String,
    ty: TypeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMetadata {
    columns: Vec<ColumnInfo>,
}

impl ResultMetadata {
    pub fn from_columns(columns: &[Column]) -> Self {
        let columns = columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                ty: TypeInfo::from_descriptor(&TypeDescriptor {
                    code: c.engine_type().code(),
                    digits: c.digits(),
                    scale: c.scale(),
                }),
            })
            .collect();
        Self { columns }
    }

    pub fn from_descriptors(columns: &[ColumnDescriptor]) -> Self {
        let columns = columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                ty: TypeInfo::from_descriptor(&c.ty),
            })
            .collect();
        Self { columns }
    }

    fn info(&self, column: usize) -> Result<&ColumnInfo> {
        checked(&self.columns, column, "column")
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_name(&self, column: usize) -> Result<&str> {
        Ok(&self.info(column)?.name)
    }

    pub fn column_label(&self, column: usize) -> Result<&str> {
        self.column_name(column)
    }

    pub fn engine_type(&self, column: usize) -> Result<EngineType> {
        Ok(self.info(column)?.ty.engine_type)
    }

    pub fn engine_type_name(&self, column: usize) -> Result<&'static str> {
        Ok(self.info(column)?.ty.engine_type.display_name())
    }

    pub fn column_type(&self, column: usize) -> Result<SqlType> {
        Ok(self.info(column)?.ty.relational_type())
    }

    pub fn column_type_name(&self, column: usize) -> Result<&'static str> {
        Ok(self.column_type(column)?.name())
    }

    pub fn column_class_name(&self, column: usize) -> Result<&'static str> {
        Ok(self.column_type(column)?.host_class().name())
    }

    pub fn precision(&self, column: usize) -> Result<u32> {
        Ok(self.info(column)?.ty.digits)
    }

    pub fn scale(&self, column: usize) -> Result<u32> {
        Ok(self.info(column)?.ty.scale)
    }

    pub fn is_signed(&self, column: usize) -> Result<bool> {
        Ok(self.column_type(column)?.is_signed())
    }

    pub fn is_case_sensitive(&self, column: usize) -> Result<bool> {
        Ok(self.column_type(column)?.is_character())
    }

    pub fn is_nullable(&self, column: usize) -> Result<Nullability> {
        self.info(column)?;
        Ok(Nullability::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    params: Vec<TypeInfo>,
}

impl ParameterMetadata {
    pub fn from_descriptors(params: &[TypeDescriptor]) -> Self {
        Self {
            params: params.iter().map(TypeInfo::from_descriptor).collect(),
        }
    }

    fn info(&self, param: usize) -> Result<&TypeInfo> {
        checked(&self.params, param, "parameter")
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn engine_type(&self, param: usize) -> Result<EngineType> {
        Ok(self.info(param)?.engine_type)
    }

    pub fn parameter_type(&self, param: usize) -> Result<SqlType> {
        Ok(self.info(param)?.relational_type())
    }

    pub fn parameter_type_name(&self, param: usize) -> Result<&'static str> {
        Ok(self.parameter_type(param)?.name())
    }

    pub fn parameter_class_name(&self, param: usize) -> Result<&'static str> {
        Ok(self.parameter_type(param)?.host_class().name())
    }

    pub fn precision(&self, param: usize) -> Result<u32> {
        Ok(self.info(param)?.digits)
    }

    pub fn scale(&self, param: usize) -> Result<u32> {
        Ok(self.info(param)?.scale)
    }

    pub fn is_signed(&self, param: usize) -> Result<bool> {
        Ok(self.parameter_type(param)?.is_signed())
    }

    pub fn is_nullable(&self, param: usize) -> Result<Nullability> {
        self.info(param)?;
        Ok(Nullability::Unknown)
    }

    pub fn parameter_mode(&self, param: usize) -> Result<ParameterMode> {
        self.info(param)?;
        Ok(ParameterMode::In)
    }
}
