//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;

pub trait DataPort {
    /// All bars, ordered by (timestamp, token id).
    fn load_bars(&self) -> Result<Vec<Bar>, ProbtraderError>;

    fn fetch_token(&self, token_id: &str) -> Result<Vec<Bar>, ProbtraderError> {
        Ok(self
            .load_bars()?
            .into_iter()
            .filter(|b| b.token_id == token_id)
            .collect())
    }

    fn list_tokens(&self) -> Result<Vec<String>, ProbtraderError> {
        let mut tokens: Vec<String> = self.load_bars()?.into_iter().map(|b| b.token_id).collect();
        tokens.sort();
        tokens.dedup();
        Ok(tokens)
    }
}
