use std::{
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use uuid::Uuid;

use crate::{
    common::{error::TradeEngineError, persist::Persister, types::SerdeGenericTrait},
    protocol::ProcessModel,
    trade::{ProcessState, RoleVariant, Trade},
};

#[typetag::serde(name = "crusty_trade_data")]
impl SerdeGenericTrait for Trade {
    fn any_ref(&self) -> &dyn std::any::Any {
        self
    }
}

pub(crate) struct TradeData {
    pub(crate) trade_uuid: Uuid,
    store: Arc<RwLock<Trade>>,
    persister: Persister,
}

impl TradeData {
    pub(crate) fn new(dir_path: impl AsRef<Path>, trade: Trade) -> Self {
        let trade_uuid = trade.trade_uuid;
        let data_path = dir_path.as_ref().join(format!("{}-trade.json", trade_uuid));

        let store = Arc::new(RwLock::new(trade));
        let generic_store: Arc<RwLock<dyn SerdeGenericTrait + 'static>> = store.clone();
        let persister = Persister::new(generic_store, data_path);
        persister.queue();

        Self {
            trade_uuid,
            store,
            persister,
        }
    }

    pub(crate) fn restore(data_path: impl AsRef<Path>) -> Result<(Uuid, Self), TradeEngineError> {
        let json = Persister::restore(&data_path)?;
        let trade: Trade = serde_json::from_str(&json)?;

        let trade_uuid = trade.trade_uuid;

        let store = Arc::new(RwLock::new(trade));
        let generic_store: Arc<RwLock<dyn SerdeGenericTrait + 'static>> = store.clone();
        let persister = Persister::new(generic_store, &data_path);
        persister.queue();

        let data = Self {
            trade_uuid,
            store,
            persister,
        };

        Ok((trade_uuid, data))
    }

    fn read_store(&self) -> RwLockReadGuard<'_, Trade> {
        match self.store.read() {
            Ok(store) => store,
            Err(error) => {
                panic!("Error reading store - {}", error);
            }
        }
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, Trade> {
        match self.store.write() {
            Ok(store) => store,
            Err(error) => {
                panic!("Error writing store - {}", error);
            }
        }
    }

    // Getter methods

    pub(crate) fn trade(&self) -> Trade {
        self.read_store().to_owned()
    }

    pub(crate) fn role(&self) -> RoleVariant {
        self.read_store().role
    }

    pub(crate) fn state(&self) -> ProcessState {
        self.read_store().state
    }

    pub(crate) fn error_log(&self) -> Vec<String> {
        self.read_store().error_log.to_owned()
    }

    pub(crate) fn failure_cause(&self) -> Option<String> {
        self.read_store().failure_cause.to_owned()
    }

    pub(crate) fn process_model(&self) -> ProcessModel {
        self.read_store().process_model.to_owned()
    }

    // Setter methods

    pub(crate) fn set_process_model(&mut self, process_model: ProcessModel) {
        self.write_store().process_model = process_model;
        self.persister.queue();
    }

    pub(crate) fn transition_to(&mut self, state: ProcessState) -> Result<(), TradeEngineError> {
        let current_state = self.state();
        if !current_state.can_transition_to(state) {
            return Err(TradeEngineError::Simple(format!(
                "Trade w/ TradeUUID {} cannot transition from {} to {}",
                self.trade_uuid, current_state, state
            )));
        }
        self.write_store().state = state;
        self.persister.queue();
        Ok(())
    }

    pub(crate) fn append_error_log(&mut self, diagnostics: Vec<String>) {
        self.write_store().error_log.extend(diagnostics);
        self.persister.queue();
    }

    pub(crate) fn set_failure_cause(&mut self, cause: String) {
        self.write_store().failure_cause = Some(cause);
        self.persister.queue();
    }

    pub(crate) fn terminate(self) {
        self.persister.terminate()
    }
}
