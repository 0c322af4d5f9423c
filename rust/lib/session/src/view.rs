use subsearch_types::{ResultState, SearchQuery};

use crate::store::SessionState;

/// The only state the presentation layer depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub raw_input: SearchQuery,
    pub result: ResultState,
}

impl From<&SessionState> for SessionView {
    fn from(state: &SessionState) -> Self {
        Self {
            raw_input: state.raw_input.clone(),
            result: state.result.clone(),
        }
    }
}
