//! Parallel batch formatting
//!
//! Uses Rayon to reformat many independent documents at once. Each worker
//! checks a parser out of the default pool for the duration of one document.

use crate::error::ParseError;
use crate::pool::default_pool;
use crate::serialize::Mode;
use rayon::prelude::*;

/// Parse one document and serialize it again in `mode`
pub fn format_one(input: &[u8], mode: Mode) -> Result<Vec<u8>, ParseError> {
    let pool = default_pool();
    let mut parser = pool.acquire();
    let result = parser.parse(input).map(|doc| doc.to_xml(mode));
    pool.release(parser);
    result
}

/// Reformat many documents in parallel; results keep the input order
pub fn format_parallel(inputs: &[&[u8]], mode: Mode) -> Vec<Result<Vec<u8>, ParseError>> {
    inputs
        .par_iter()
        .map(|input| format_one(input, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_format_one() {
        let out = format_one(b"<a>\n  <b>x</b>\n</a>", Mode::Compact).unwrap();
        assert_eq!(out, b"<?xml version=\"1.0\"?><a><b>x</b></a>");
    }

    #[test]
    fn test_format_parallel() {
        let docs: Vec<String> = (0..32).map(|i| format!("<n id=\"{}\"><v>{}</v></n>", i, i)).collect();
        let mut inputs: Vec<&[u8]> = docs.iter().map(|d| d.as_bytes()).collect();
        inputs.push(b"<broken>");

        let results = format_parallel(&inputs, Mode::Compact);
        assert_eq!(results.len(), 33);
        for (i, result) in results.iter().take(32).enumerate() {
            let expect = format!("<?xml version=\"1.0\"?><n id=\"{}\"><v>{}</v></n>", i, i);
            assert_eq!(result.as_deref().unwrap(), expect.as_bytes());
        }
        assert_eq!(
            results[32].as_ref().unwrap_err().kind,
            ErrorKind::UnexpectedEndOfInput
        );
    }
}
