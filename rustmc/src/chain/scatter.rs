use std::io::BufRead;

use evocore::data::filters::{FilterSet, FILTS};
use evocore::data::star::StellarSystem;

use crate::chain::error::ChainError;
use crate::chain::scan::TokenScanner;

/// The scatter/photometry stream.
///
/// The first header line carries one use-this-filter flag per filter slot and
/// fixes the active `FilterSet` for the run; the second header line is
/// skipped. Each following record holds a star name, one observed magnitude
/// per active filter, as many ignored fields, two ignored floats and the
/// observed-status code.
pub struct ScatterReader<R> {
    scanner: TokenScanner<R>,
    filters: FilterSet,
}

impl<R: BufRead> ScatterReader<R> {
    pub fn new(reader: R) -> Result<Self, ChainError> {
        let mut scanner = TokenScanner::new(reader);

        let mut flags = [false; FILTS];
        for flag in flags.iter_mut() {
            *flag = scanner.expect_i64()? != 0;
        }
        scanner.skip_line()?; // rest of the flag line
        scanner.skip_line()?; // second header line

        Ok(ScatterReader {
            scanner,
            filters: FilterSet::from_flags(&flags),
        })
    }

    /// Active filter set fixed by the header.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Reads one star record into `system`; `false` once the stream has ended.
    pub fn read_record(&mut self, system: &mut StellarSystem) -> Result<bool, ChainError> {
        let name = match self.scanner.next_token()? {
            Some(name) => name,
            None => return Ok(false),
        };
        system.name = name;

        for i in 0..self.filters.len() {
            system.obs_phot[i] = self.scanner.expect_f64()?;
        }
        self.scanner.skip_tokens(self.filters.len())?;
        self.scanner.skip_tokens(2)?;
        system.observed_status = self.scanner.expect_i64()? as i32;
        self.scanner.skip_line()?;
        Ok(true)
    }
}
