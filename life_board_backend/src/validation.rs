//! Request validation.
//!
//! Checks never touch storage. Every applicable check runs and all failures
//! are collected, so a caller sees everything wrong with a request at once.

use crate::codec::from_array_form;
use crate::types::{
    BoardId, LifeError, UploadBoardRequest, MAX_ADVANCE_STEPS, MAX_DIMENSION, MIN_ADVANCE_STEPS,
    MIN_DIMENSION,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, message: String) {
        self.errors.push(message);
    }

    pub fn into_result(self) -> Result<(), LifeError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LifeError::Validation { errors: self.errors })
        }
    }
}

fn check_dimension(result: &mut ValidationResult, name: &str, value: u32) {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        result.fail(format!(
            "{} must be between {} and {}, got {}",
            name, MIN_DIMENSION, MAX_DIMENSION, value
        ));
    }
}

/// Validate an upload. A missing grid skips the structural checks; the
/// declared dimensions are range-checked regardless.
pub fn validate_upload(request: &UploadBoardRequest) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_dimension(&mut result, "rows", request.rows);
    check_dimension(&mut result, "columns", request.columns);

    let Some(rows) = request.grid.as_ref() else {
        result.fail("grid is required".to_string());
        return result;
    };

    let actual_rows = rows.len();
    if actual_rows != request.rows as usize {
        result.fail(format!(
            "rows is {} but the grid has {} rows",
            request.rows, actual_rows
        ));
    }

    match from_array_form(rows) {
        Ok(grid) => {
            if actual_rows > 0 && grid.columns() != request.columns as usize {
                result.fail(format!(
                    "columns is {} but the grid has {} columns",
                    request.columns,
                    grid.columns()
                ));
            }
        }
        Err(e) => result.fail(e.to_string()),
    }

    result
}

pub fn validate_generation_count(count: u32) -> ValidationResult {
    let mut result = ValidationResult::default();
    if !(MIN_ADVANCE_STEPS..=MAX_ADVANCE_STEPS).contains(&count) {
        result.fail(format!(
            "generations must be between {} and {}, got {}",
            MIN_ADVANCE_STEPS, MAX_ADVANCE_STEPS, count
        ));
    }
    result
}

pub fn validate_board_id(id: &BoardId) -> ValidationResult {
    let mut result = ValidationResult::default();
    if id.is_nil() {
        result.fail("board id must not be empty".to_string());
    }
    result
}

/// Parse and validate a board id received as text.
pub fn parse_board_id(text: &str) -> Result<BoardId, LifeError> {
    let id: BoardId = text.parse().map_err(LifeError::validation)?;
    validate_board_id(&id).into_result()?;
    Ok(id)
}
