//! One-Hot Encoding for Nominal Fields

/// One-hot encode `category` against `known` categories.
///
/// Returns one `(category, indicator)` pair per known category, in order,
/// skipping the first one when `drop_first` is set. A category that is not in
/// `known` yields all zeros.
pub fn one_hot<'a, S: AsRef<str>>(
    category: &str,
    known: &'a [S],
    drop_first: bool,
) -> Vec<(&'a str, f64)> {
    let skip = usize::from(drop_first);
    known
        .iter()
        .skip(skip)
        .map(|k| {
            let k = k.as_ref();
            (k, if k == category { 1.0 } else { 0.0 })
        })
        .collect()
}

/// A known category of a nominal field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Canonical value
    pub value: &'static str,
    /// Label used in the column name
    pub label: &'static str,
    /// Other spellings accepted on input (dataset labels, numeric codes)
    pub aliases: &'static [&'static str],
}

/// Fixed vocabulary of a nominal field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    /// Canonical record field name
    pub field: &'static str,
    /// Column prefix (`<prefix>_<label>`)
    pub prefix: &'static str,
    /// Categories in encoding order; the first is dropped
    pub categories: &'static [Category],
}

/// Seasons, as coded in the public bike-sharing dataset (1..=4)
pub const SEASONS: Vocabulary = Vocabulary {
    field: "season",
    prefix: "season",
    categories: &[
        Category { value: "spring", label: "spring", aliases: &["springer", "1"] },
        Category { value: "summer", label: "summer", aliases: &["2"] },
        Category { value: "fall", label: "fall", aliases: &["autumn", "3"] },
        Category { value: "winter", label: "winter", aliases: &["4"] },
    ],
};

/// Weather situations, as coded in the public bike-sharing dataset (1..=4)
pub const WEATHER_SITUATIONS: Vocabulary = Vocabulary {
    field: "weather-situation",
    prefix: "weather",
    categories: &[
        Category { value: "clear", label: "Clear", aliases: &["1"] },
        Category { value: "mist", label: "Mist", aliases: &["2"] },
        Category {
            value: "light-precipitation",
            label: "Light Snow",
            aliases: &["light snow", "light rain", "3"],
        },
        Category {
            value: "heavy-precipitation",
            label: "Heavy Rain",
            aliases: &["heavy rain", "heavy rain snow fog", "4"],
        },
    ],
};

impl Vocabulary {
    /// Canonical values in encoding order
    pub fn values(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.value).collect()
    }

    /// Resolve an input spelling to its canonical value (case-insensitive)
    pub fn resolve(&self, raw: &str) -> Option<&'static str> {
        let needle = raw.trim();
        self.categories
            .iter()
            .find(|c| {
                c.value.eq_ignore_ascii_case(needle)
                    || c.label.eq_ignore_ascii_case(needle)
                    || c.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
            })
            .map(|c| c.value)
    }

    /// Column name for a canonical value
    pub fn column(&self, value: &str) -> Option<String> {
        self.categories
            .iter()
            .find(|c| c.value == value)
            .map(|c| format!("{}_{}", self.prefix, c.label))
    }

    /// One-hot columns for a raw input value, first category dropped
    pub fn encode(&self, raw: &str) -> Vec<(String, f64)> {
        let category = self.resolve(raw).unwrap_or(raw);
        let known = self.values();
        one_hot(category, &known, true)
            .into_iter()
            .filter_map(|(value, flag)| self.column(value).map(|col| (col, flag)))
            .collect()
    }
}
