//! Three-digit mine counter decoding.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use mine_analyzer_dom::{HostDocument, Selector};

lazy_static! {
    static ref DIGIT_CLASS: Regex = Regex::new(r"(?:hd_)?top-area-num(\d)").unwrap();
}

/// Decode the digit shown by a counter element from its class list.
pub fn decode_digit(class_name: &str) -> Option<u32> {
    DIGIT_CLASS
        .captures(class_name)
        .and_then(|caps| caps[1].parse().ok())
}

/// Reads the hundreds/tens/ones counter display.
#[derive(Debug, Clone)]
pub struct MineCounterReader {
    digit_ids: [String; 3],
}

impl MineCounterReader {
    /// Reader for the given hundreds, tens and ones element ids.
    pub fn new(hundreds: &str, tens: &str, ones: &str) -> Self {
        Self {
            digit_ids: [hundreds.to_string(), tens.to_string(), ones.to_string()],
        }
    }

    /// Current counter value, or `None` if any digit is missing or unreadable.
    pub fn read(&self, document: &dyn HostDocument) -> Option<u32> {
        let mut total = 0;
        for id in &self.digit_ids {
            let node = document.query(&Selector::id(id.as_str()))?;
            let digit = decode_digit(&document.class_name(node)?)?;
            total = total * 10 + digit;
        }
        trace!(mines = total, "mine counter read");
        Some(total)
    }
}

impl Default for MineCounterReader {
    fn default() -> Self {
        Self::new("top_area_mines_100", "top_area_mines_10", "top_area_mines_1")
    }
}
