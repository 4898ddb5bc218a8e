//! Speculation guard shared by the productions.

use super::{Parser, ParserState};

/// Checkpoint of the cursor and the diagnostic count. Dropped without
/// [`commit`](ParserTransaction::commit), it rewinds the parser and discards
/// the diagnostics reported since it began.
pub(crate) struct ParserTransaction<'a, 'arena, 'src> {
    pub(crate) parser: &'a mut Parser<'arena, 'src>,
    state: ParserState,
    committed: bool,
}

impl<'a, 'arena, 'src> ParserTransaction<'a, 'arena, 'src> {
    pub(crate) fn new(parser: &'a mut Parser<'arena, 'src>) -> Self {
        let state = parser.save_state();
        Self {
            parser,
            state,
            committed: false,
        }
    }

    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ParserTransaction<'_, '_, '_> {
    fn drop(&mut self) {
        if !self.committed {
            log::trace!("transaction rolled back to token {}", self.state.current_idx);
            self.parser.restore_state(self.state.clone());
        }
    }
}
