//! Display helpers for results and upload feedback.

/// Title-case every space-separated word: "golden RETRIEVER" becomes
/// "Golden Retriever".
pub fn format_breed_name(breed: &str) -> String {
    breed
        .trim()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match confidence in `0.0..=1.0` as a whole percentage.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Cut `text` to `max_len` characters, appending "..." when shortened.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Human-readable file size, e.g. "1.5 KB".
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["Bytes", "KB", "MB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{rounded} {}", UNITS[unit])
}

pub fn format_image_dimensions(width: u32, height: u32) -> String {
    format!("{width}×{height}px")
}

/// Success text for a batch upload.
pub fn upload_summary(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Successfully uploaded {count} image{plural}")
}
