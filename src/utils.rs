use crate::engine::{Board, Color};
use crate::error::{CrushError, Result};

/// Parses an array of string slices into a `Board` object.
///
/// Each string slice in the input array represents a row on the board, starting from row 0
/// (the top row). Every character is a color digit `'0'..='6'`. Unlike a scheme with
/// holes, a crush board is always fully populated, so all rows must have the same length.
///
/// # Arguments
/// * `s`: A slice of string slices (`&[&str]`) representing the rows of the board.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful.
/// * `Err(CrushError)` if:
///     - No rows are given, or the first row is empty (`Precondition`).
///     - Rows differ in length (`Precondition`).
///     - A character is not a decimal digit (`Precondition`).
///     - A digit is outside the palette (`InvalidColor`).
///
/// # Examples
/// ```
/// use crush_solver::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["012", "345"]).unwrap();
/// assert_eq!(board.width(), 3);
/// assert_eq!(board.tile_at(1, 1).unwrap().color().value(), 4);
///
/// assert!(board_from_str_array(&["01X"]).is_err());
/// assert!(board_from_str_array(&["012", "34"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board> {
    let mut scheme: Vec<Vec<u8>> = Vec::with_capacity(s.len());
    for (r, row_str) in s.iter().enumerate() {
        let mut row = Vec::with_capacity(row_str.len());
        for (c, ch) in row_str.chars().enumerate() {
            let digit = ch.to_digit(10).ok_or_else(|| {
                CrushError::Precondition(format!(
                    "unrecognized character '{}' in row {} col {}",
                    ch, r, c
                ))
            })?;
            row.push(Color::new(digit as u8)?.value());
        }
        scheme.push(row);
    }
    Board::from_scheme(&scheme)
}

/// Parses a board from free-form text: one row of digits per line.
///
/// Surrounding whitespace and blank lines are ignored, so board files may end
/// with a newline or carry indentation.
pub fn board_from_text(text: &str) -> Result<Board> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    board_from_str_array(&rows)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_from_str_array_valid() {
        let board_str = [
            "0123456012",
            "1234560123",
            "2345601234",
            "3456012345",
            "4560123456",
            "5601234560",
            "0123456012",
            "1234560123",
            "2345601234",
            "3456012345",
        ];
        let board = board_from_str_array(&board_str).unwrap();
        assert_eq!((board.width(), board.height()), (10, 10));
        assert_eq!(board.tile_at(0, 0).unwrap().color().value(), 0);
        assert_eq!(board.tile_at(9, 5).unwrap().color().value(), 0);
        assert_eq!(board.tile_at(6, 0).unwrap().color().value(), 6);
    }

    #[test]
    fn test_board_from_str_array_invalid_char() {
        let result = board_from_str_array(&["012345601X"]);
        match result {
            Err(CrushError::Precondition(msg)) => {
                assert!(msg.contains("unrecognized character 'X'"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_board_from_str_array_with_spaces() {
        let result = board_from_str_array(&["0 1 2"]);
        assert!(matches!(result, Err(CrushError::Precondition(msg)) if msg.contains("' '")));
    }

    #[test]
    fn test_board_from_str_array_color_out_of_palette() {
        assert_eq!(
            board_from_str_array(&["0127"]),
            Err(CrushError::InvalidColor(7))
        );
    }

    #[test]
    fn test_board_from_str_array_ragged_rows() {
        let result = board_from_str_array(&["0123", "012"]);
        assert!(matches!(result, Err(CrushError::Precondition(_))));
    }

    #[test]
    fn test_board_from_str_array_empty_input() {
        let board_str: [&str; 0] = [];
        assert!(matches!(
            board_from_str_array(&board_str),
            Err(CrushError::Precondition(_))
        ));
        assert!(board_from_str_array(&[""]).is_err());
    }

    #[test]
    fn test_board_from_text_skips_blank_lines() {
        let board = board_from_text("\n  0123\n\n  4560\n").unwrap();
        assert_eq!((board.width(), board.height()), (4, 2));
        assert_eq!(board.to_scheme_string(), "0123\n4560");
    }
}
