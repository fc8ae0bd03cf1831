//! Fuzz target for the table-driven UTF-8 validator.
//!
//! The validator and boundary check must agree with the standard library on
//! arbitrary bytes, and loading must accept exactly the valid inputs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use textcore::{PieceTable, Utf8Validator};

fuzz_target!(|data: &[u8]| {
    let expected = std::str::from_utf8(data);
    assert_eq!(
        Utf8Validator::validate(data),
        expected.map(|_| ()).map_err(|e| e.valid_up_to())
    );

    if let Ok(text) = expected {
        for i in 0..=data.len() {
            assert_eq!(
                Utf8Validator::is_char_boundary(data, i),
                text.is_char_boundary(i)
            );
        }
    }

    assert_eq!(PieceTable::from_bytes(data.to_vec()).is_ok(), expected.is_ok());
});
