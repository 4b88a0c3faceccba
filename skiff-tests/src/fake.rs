use anyhow::anyhow;
use skiff_core::{
    Command, DataReader, DbConnection, DbProviderFactory, IsolationLevel, ResultSet, Row,
    RowNames, Value, async_trait,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// Something a [`FakeConnection`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    Close,
    Begin(IsolationLevel),
    Commit,
    Rollback,
    NonQuery(Command),
    Scalar(Command),
    Reader(Command),
}

impl Call {
    pub fn command(&self) -> Option<&Command> {
        match self {
            Call::NonQuery(command) | Call::Scalar(command) | Call::Reader(command) => {
                Some(command)
            }
            _ => None,
        }
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    connection_strings: Vec<String>,
    non_queries: VecDeque<u64>,
    scalars: VecDeque<Value>,
    readers: VecDeque<Vec<ResultSet>>,
    failures: VecDeque<String>,
    delay: Option<Duration>,
}

/// In memory provider answering with scripted results and recording every call.
///
/// Results are consumed in order: a non query without a scripted count affects one row, a
/// scalar without a scripted value is NULL and a reader without scripted result sets is empty.
/// A scripted failure is returned by the next begin, commit, rollback or execution.
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_non_query(&self, rows_affected: u64) -> &Self {
        self.state().non_queries.push_back(rows_affected);
        self
    }

    pub fn push_scalar(&self, value: impl Into<Value>) -> &Self {
        self.state().scalars.push_back(value.into());
        self
    }

    /// Result sets returned by the next reader, one per statement of the command.
    pub fn push_result_sets(&self, sets: Vec<ResultSet>) -> &Self {
        self.state().readers.push_back(sets);
        self
    }

    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.state().failures.push_back(message.into());
        self
    }

    /// Every execution waits `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Executed commands, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.state()
            .calls
            .iter()
            .filter_map(Call::command)
            .cloned()
            .collect()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.commands().pop()
    }

    /// Calls that are not executions: open, close, begin, commit, rollback.
    pub fn lifecycle(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.command().is_none())
            .cloned()
            .collect()
    }

    pub fn created_connections(&self) -> Vec<String> {
        self.state().connection_strings.clone()
    }

    /// Forget the recorded calls, scripted results are kept.
    pub fn clear(&self) {
        self.state().calls.clear();
    }
}

impl DbProviderFactory for FakeProvider {
    fn create_connection(&self, connection_string: &str) -> anyhow::Result<Box<dyn DbConnection>> {
        if connection_string.is_empty() {
            return Err(anyhow!("The connection string is empty"));
        }
        self.state()
            .connection_strings
            .push(connection_string.to_string());
        Ok(Box::new(FakeConnection {
            provider: self.clone(),
            open: false,
        }))
    }
}

pub struct FakeConnection {
    provider: FakeProvider,
    open: bool,
}

impl FakeConnection {
    fn record(&self, call: Call) -> anyhow::Result<()> {
        let mut state = self.provider.state();
        let is_command = call.command().is_some();
        state.calls.push(call);
        if is_command && !self.open {
            return Err(anyhow!("The connection is not open"));
        }
        match state.failures.pop_front() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    async fn execute(&self, call: Call) -> anyhow::Result<()> {
        let delay = self.provider.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(call)
    }
}

#[async_trait]
impl DbConnection for FakeConnection {
    async fn open(&mut self) -> anyhow::Result<()> {
        if self.open {
            return Err(anyhow!("The connection is already open"));
        }
        self.provider.state().calls.push(Call::Open);
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.provider.state().calls.push(Call::Close);
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn begin_transaction(&mut self, isolation_level: IsolationLevel) -> anyhow::Result<()> {
        if !self.open {
            return Err(anyhow!("Cannot begin a transaction on a closed connection"));
        }
        self.record(Call::Begin(isolation_level))
    }

    async fn commit(&mut self) -> anyhow::Result<()> {
        self.record(Call::Commit)
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        self.record(Call::Rollback)
    }

    async fn execute_non_query(&mut self, command: &Command) -> anyhow::Result<u64> {
        self.execute(Call::NonQuery(command.clone())).await?;
        Ok(self.provider.state().non_queries.pop_front().unwrap_or(1))
    }

    async fn execute_scalar(&mut self, command: &Command) -> anyhow::Result<Value> {
        self.execute(Call::Scalar(command.clone())).await?;
        Ok(self
            .provider
            .state()
            .scalars
            .pop_front()
            .unwrap_or(Value::Null))
    }

    async fn execute_reader<'c>(
        &'c mut self,
        command: &Command,
    ) -> anyhow::Result<Box<dyn DataReader + 'c>> {
        self.execute(Call::Reader(command.clone())).await?;
        let sets = self
            .provider
            .state()
            .readers
            .pop_front()
            .unwrap_or_default();
        Ok(Box::new(FakeReader::new(sets)))
    }
}

struct FakeReader {
    labels: RowNames,
    rows: VecDeque<Row>,
    sets: VecDeque<ResultSet>,
}

impl FakeReader {
    fn new(sets: Vec<ResultSet>) -> Self {
        let mut sets = VecDeque::from(sets);
        let first = sets.pop_front().unwrap_or_default();
        Self {
            labels: first.labels,
            rows: first.rows.into(),
            sets,
        }
    }
}

#[async_trait]
impl DataReader for FakeReader {
    fn labels(&self) -> RowNames {
        self.labels.clone()
    }

    async fn read(&mut self) -> anyhow::Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    async fn next_result(&mut self) -> anyhow::Result<bool> {
        match self.sets.pop_front() {
            Some(set) => {
                self.labels = set.labels;
                self.rows = set.rows.into();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Result set with the columns `labels` and one row per entry of `rows`.
pub fn result_set<const N: usize>(labels: [&str; N], rows: Vec<[Value; N]>) -> ResultSet {
    ResultSet {
        labels: labels.iter().map(|v| v.to_string()).collect(),
        rows: rows.into_iter().map(Row::from).collect(),
    }
}
