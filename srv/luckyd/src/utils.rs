use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Short base-36 identifier for a history entry
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Cosmetic number shown while a ball is rolling.
/// An inverted range collapses to `min`.
pub fn rolling_value(min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Escape text that ends up inside the stage page
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render a number list the way the prompt and the page show it: `[1, 2, 3]`
pub fn join_numbers(numbers: &[i64]) -> String {
    let parts: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_rolling_value_stays_in_range() {
        for _ in 0..200 {
            let v = rolling_value(3, 7);
            assert!((3..=7).contains(&v));
        }
        assert_eq!(rolling_value(5, 5), 5);
        assert_eq!(rolling_value(9, 2), 9);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_join_numbers() {
        assert_eq!(join_numbers(&[]), "[]");
        assert_eq!(join_numbers(&[4, 8, 15]), "[4, 8, 15]");
    }
}
