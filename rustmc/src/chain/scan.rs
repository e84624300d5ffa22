use std::io::BufRead;

use crate::chain::error::ChainError;

/// Whitespace token scanner over a chain stream.
///
/// The chain files are whitespace/line-delimited; this scanner hands out one
/// token at a time, tracks the physical line number for error reporting, and
/// distinguishes a clean end of stream (`Ok(None)`) from a malformed field.
pub struct TokenScanner<R> {
    reader: R,
    line: String,
    pos: usize,
    line_no: usize,
}

impl<R: BufRead> TokenScanner<R> {
    pub fn new(reader: R) -> Self {
        TokenScanner {
            reader,
            line: String::new(),
            pos: 0,
            line_no: 0,
        }
    }

    /// Physical line number of the most recently buffered line.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Returns the next token, or `None` at end of stream.
    pub fn next_token(&mut self) -> Result<Option<String>, ChainError> {
        loop {
            let rest = &self.line[self.pos..];
            if let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
                let begin = self.pos + start;
                let end = self.line[begin..]
                    .find(char::is_whitespace)
                    .map(|e| begin + e)
                    .unwrap_or(self.line.len());
                self.pos = end;
                return Ok(Some(self.line[begin..end].to_string()));
            }

            self.line.clear();
            self.pos = 0;
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
        }
    }

    /// Returns the next token, treating end of stream as an error.
    pub fn expect_token(&mut self) -> Result<String, ChainError> {
        self.next_token()?.ok_or(ChainError::UnexpectedEof {
            line: self.line_no,
        })
    }

    /// Parses the next token as a float; `None` at end of stream.
    pub fn next_f64(&mut self) -> Result<Option<f64>, ChainError> {
        match self.next_token()? {
            None => Ok(None),
            Some(token) => token
                .parse()
                .map(Some)
                .map_err(|_| ChainError::Parse {
                    line: self.line_no,
                    token,
                }),
        }
    }

    pub fn expect_f64(&mut self) -> Result<f64, ChainError> {
        self.next_f64()?.ok_or(ChainError::UnexpectedEof {
            line: self.line_no,
        })
    }

    pub fn expect_i64(&mut self) -> Result<i64, ChainError> {
        let token = self.expect_token()?;
        token.parse().map_err(|_| ChainError::Parse {
            line: self.line_no,
            token,
        })
    }

    pub fn expect_usize(&mut self) -> Result<usize, ChainError> {
        let token = self.expect_token()?;
        token.parse().map_err(|_| ChainError::Parse {
            line: self.line_no,
            token,
        })
    }

    /// Discards `n` tokens.
    pub fn skip_tokens(&mut self, n: usize) -> Result<(), ChainError> {
        for _ in 0..n {
            self.expect_token()?;
        }
        Ok(())
    }

    /// Advances past the next newline.
    ///
    /// Consumes the remainder of the buffered line when part of it is still
    /// pending, otherwise reads and discards one whole line.
    pub fn skip_line(&mut self) -> Result<(), ChainError> {
        if self.pos < self.line.len() {
            self.pos = self.line.len();
        } else {
            self.line.clear();
            self.pos = 0;
            if self.reader.read_line(&mut self.line)? > 0 {
                self.line_no += 1;
                self.pos = self.line.len();
            }
        }
        Ok(())
    }
}
