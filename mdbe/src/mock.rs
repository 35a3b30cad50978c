//! In-process engine that records every call, for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::native::{
    BoundValue, Engine, NativeError, NativeResult, Outcome, PreparedInfo, RawColumn, RawData,
    ResultHandle, StatementHandle, TypeDescriptor, UpdateCount,
};
use crate::types::EngineType;

pub fn int_raw_column(name: &str, values: &[i32]) -> RawColumn {
    RawColumn {
        name: name.to_string(),
        code: EngineType::Int32.code(),
        digits: 0,
        data: RawData::Fixed {
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            scale: 0.0,
            nulls: None,
        },
    }
}

#[derive(Default)]
struct State {
    params: Vec<TypeDescriptor>,
    outcomes: VecDeque<Outcome>,
    results: HashMap<i64, Vec<RawColumn>>,
    next_id: i64,
    bound: Vec<Option<BoundValue>>,
    executions: usize,
    fail_on: Option<usize>,
    executed: Vec<String>,
    last_max_rows: u64,
    released_results: usize,
    released_statements: usize,
    autocommit: bool,
    closed: bool,
}

/// Clones share their recorded state.
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<Mutex<State>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                autocommit: true,
                next_id: 1,
                ..State::default()
            })),
        }
    }

    /// Prepared statements get `count` parameters of unknown type.
    pub fn with_params(self, count: usize) -> Self {
        self.with_param_types(vec![TypeDescriptor::unknown(); count])
    }

    pub fn with_param_types(self, params: Vec<TypeDescriptor>) -> Self {
        self.state.lock().unwrap().params = params;
        self
    }

    /// The `n`th prepared execution (1-based) fails.
    pub fn failing_on_execution(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_on = Some(n);
        self
    }

    pub fn queue_rows(&self, columns: Vec<RawColumn>, rows: usize) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let count = columns.len();
        state.results.insert(id, columns);
        state.outcomes.push_back(Outcome::Rows {
            result: ResultHandle(id),
            rows,
            columns: count,
        });
    }

    pub fn queue_update(&self, count: UpdateCount) {
        self.state
            .lock()
            .unwrap()
            .outcomes
            .push_back(Outcome::Affected(count));
    }

    pub fn bound(&self) -> Vec<BoundValue> {
        self.state.lock().unwrap().bound.iter().flatten().cloned().collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn last_max_rows(&self) -> u64 {
        self.state.lock().unwrap().last_max_rows
    }

    pub fn released_results(&self) -> usize {
        self.state.lock().unwrap().released_results
    }

    pub fn released_statements(&self) -> usize {
        self.state.lock().unwrap().released_statements
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

impl Engine for MockEngine {
    fn execute(&self, sql: &str, max_rows: u64) -> NativeResult<Outcome> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());
        state.last_max_rows = max_rows;
        Ok(state
            .outcomes
            .pop_front()
            .unwrap_or(Outcome::Affected(UpdateCount::Rows(0))))
    }

    fn prepare(&self, _sql: &str) -> NativeResult<PreparedInfo> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        Ok(PreparedInfo {
            handle: StatementHandle(id),
            params: state.params.clone(),
            columns: Vec::new(),
        })
    }

    fn bind(&self, _stmt: StatementHandle, index: usize, value: &BoundValue) -> NativeResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.bound.len() <= index {
            state.bound.resize(index + 1, None);
        }
        state.bound[index] = Some(value.clone());
        Ok(())
    }

    fn clear_bindings(&self, _stmt: StatementHandle) -> NativeResult<()> {
        self.state.lock().unwrap().bound.clear();
        Ok(())
    }

    fn execute_prepared(&self, _stmt: StatementHandle, max_rows: u64) -> NativeResult<Outcome> {
        let mut state = self.state.lock().unwrap();
        state.executions += 1;
        state.last_max_rows = max_rows;
        if state.fail_on == Some(state.executions) {
            return Err(NativeError::new("constraint violated"));
        }
        Ok(state
            .outcomes
            .pop_front()
            .unwrap_or(Outcome::Affected(UpdateCount::Rows(1))))
    }

    fn fetch_all(
        &self,
        result: ResultHandle,
        _rows: usize,
        _columns: usize,
    ) -> NativeResult<Vec<RawColumn>> {
        self.state
            .lock()
            .unwrap()
            .results
            .remove(&result.0)
            .ok_or_else(|| NativeError::new(format!("no result {}", result.0)))
    }

    fn release_result(&self, _result: ResultHandle) -> NativeResult<()> {
        self.state.lock().unwrap().released_results += 1;
        Ok(())
    }

    fn release_statement(&self, _stmt: StatementHandle) -> NativeResult<()> {
        self.state.lock().unwrap().released_statements += 1;
        Ok(())
    }

    fn autocommit(&self) -> NativeResult<bool> {
        Ok(self.state.lock().unwrap().autocommit)
    }

    fn set_autocommit(&self, enabled: bool) -> NativeResult<()> {
        self.state.lock().unwrap().autocommit = enabled;
        Ok(())
    }

    fn close(&mut self) -> NativeResult<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
