pub trait NormalizeAnswer {
    fn normalize_answer(&self) -> String;
}

// "Big  Dog" -> "bigdog"
impl NormalizeAnswer for str {
    fn normalize_answer(&self) -> String {
        self.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
    }
}

/// Implement the trait for `String` by forwarding the method to `str`
impl NormalizeAnswer for String {
    fn normalize_answer(&self) -> String {
        self.as_str().normalize_answer()
    }
}
