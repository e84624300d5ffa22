use std::io::BufRead;

use crate::chain::error::ChainError;
use crate::chain::scan::TokenScanner;

/// One of the two parallel mass-chain streams.
///
/// The header token sequence ends in the star count; every row carries one
/// sampled mass per star. End of stream anywhere inside a row ends the row
/// sequence (the partial row is discarded).
pub struct MassChain<R> {
    scanner: TokenScanner<R>,
    n_stars: usize,
}

impl<R: BufRead> MassChain<R> {
    pub fn new(reader: R) -> Result<Self, ChainError> {
        let mut scanner = TokenScanner::new(reader);
        scanner.skip_tokens(6)?;
        let n_stars = scanner.expect_usize()?;
        if n_stars < 1 {
            return Err(ChainError::BadStarCount(n_stars));
        }
        Ok(MassChain { scanner, n_stars })
    }

    pub fn star_count(&self) -> usize {
        self.n_stars
    }

    /// Reads one row of masses into `out`; `false` once the stream has ended.
    pub fn read_row(&mut self, out: &mut [f64]) -> Result<bool, ChainError> {
        debug_assert_eq!(out.len(), self.n_stars);
        for slot in out.iter_mut() {
            match self.scanner.next_f64()? {
                Some(mass) => *slot = mass,
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "sampled masses for run x 42 2\n\
                        1.10 0.55\n\
                        1.20 0.00\n";

    #[test]
    fn test_header_star_count() {
        let chain = MassChain::new(DATA.as_bytes()).unwrap();
        assert_eq!(chain.star_count(), 2);
    }

    #[test]
    fn test_rows_until_eof() {
        let mut chain = MassChain::new(DATA.as_bytes()).unwrap();
        let mut row = [0.0; 2];
        assert!(chain.read_row(&mut row).unwrap());
        assert_eq!(row, [1.10, 0.55]);
        assert!(chain.read_row(&mut row).unwrap());
        assert_eq!(row, [1.20, 0.00]);
        assert!(!chain.read_row(&mut row).unwrap());
    }

    #[test]
    fn test_partial_row_ends_stream() {
        let mut chain = MassChain::new("a b c d e f 2\n1.0\n".as_bytes()).unwrap();
        let mut row = [0.0; 2];
        assert!(!chain.read_row(&mut row).unwrap());
    }

    #[test]
    fn test_zero_stars_rejected() {
        assert!(matches!(
            MassChain::new("a b c d e f 0\n".as_bytes()),
            Err(ChainError::BadStarCount(0))
        ));
    }
}
