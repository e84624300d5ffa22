use std::io::BufRead;

use evocore::data::cluster::NPARAMS;

use crate::chain::error::ChainError;
use crate::chain::scan::TokenScanner;

/// The cluster-parameter chain stream.
///
/// The header carries one `(active-flag, initial-value)` pair per parameter;
/// chain rows only list values for flagged-active parameters, so a
/// non-varying parameter keeps its header value for the whole run.
pub struct ParamChain<R> {
    scanner: TokenScanner<R>,
    use_param: [bool; NPARAMS],
    current: [f64; NPARAMS],
}

impl<R: BufRead> ParamChain<R> {
    pub fn new(reader: R) -> Result<Self, ChainError> {
        let mut scanner = TokenScanner::new(reader);
        scanner.skip_line()?; // column-label header

        let mut use_param = [false; NPARAMS];
        let mut current = [0.0; NPARAMS];
        scanner.expect_token()?; // leading row label
        for p in 0..NPARAMS {
            use_param[p] = scanner.expect_i64()? != 0;
            current[p] = scanner.expect_f64()?;
        }
        scanner.skip_line()?;

        Ok(ParamChain {
            scanner,
            use_param,
            current,
        })
    }

    pub fn is_varying(&self, p: usize) -> bool {
        self.use_param[p]
    }

    /// Current parameter vector (header values until the first row is read).
    pub fn current(&self) -> [f64; NPARAMS] {
        self.current
    }

    /// Reads one chain row; `None` when the stream is exhausted.
    ///
    /// Only flagged-active parameters are parsed from the row; the rest keep
    /// their previous values.
    pub fn read_row(&mut self) -> Result<Option<[f64; NPARAMS]>, ChainError> {
        // leading iteration index
        if self.scanner.next_token()?.is_none() {
            return Ok(None);
        }
        for p in 0..NPARAMS {
            if self.use_param[p] {
                self.current[p] = self.scanner.expect_f64()?;
            }
        }
        Ok(Some(self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "logAge Y FeH modulus absorption\n\
                          start 1 9.0 0 0.27 1 -0.5 1 12.0 0 0.1\n";

    #[test]
    fn test_header_flags_and_initial_values() {
        let chain = ParamChain::new(HEADER.as_bytes()).unwrap();
        assert!(chain.is_varying(0));
        assert!(!chain.is_varying(1));
        assert_eq!(chain.current(), [9.0, 0.27, -0.5, 12.0, 0.1]);
    }

    #[test]
    fn test_rows_hold_inactive_parameters() {
        let data = format!("{}1 9.1 -0.4 12.1\n2 9.2 -0.3 12.2\n", HEADER);
        let mut chain = ParamChain::new(data.as_bytes()).unwrap();

        let row = chain.read_row().unwrap().unwrap();
        assert_eq!(row, [9.1, 0.27, -0.4, 12.1, 0.1]);
        let row = chain.read_row().unwrap().unwrap();
        assert_eq!(row, [9.2, 0.27, -0.3, 12.2, 0.1]);
        assert!(chain.read_row().unwrap().is_none());
    }

    #[test]
    fn test_malformed_row_is_fatal() {
        let data = format!("{}1 9.1 nope 12.1\n", HEADER);
        let mut chain = ParamChain::new(data.as_bytes()).unwrap();
        assert!(matches!(
            chain.read_row(),
            Err(ChainError::Parse { token, .. }) if token == "nope"
        ));
    }
}
