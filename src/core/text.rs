//! Small text helpers shared by the interpreter, classifier and importer

/// Fold a Portuguese accented letter to its ASCII base letter.
///
/// The mapping is strictly one char to one char, so char indices of a
/// folded string line up with the source string.
pub fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Fold every accented letter in `s`
pub fn fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Uppercase and fold accents, used for keyword and header matching
pub fn fold_upper(s: &str) -> String {
    fold(&s.to_uppercase())
}

/// Trim, lowercase and collapse runs of whitespace into a single space
pub fn normalize_note(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Values spreadsheets and dataframes emit for "no value here"
pub fn is_placeholder(s: &str) -> bool {
    matches!(s.trim().to_uppercase().as_str(), "" | "NAN" | "NONE")
}

/// Byte offset in `source` of the char that sits at byte offset `folded_offset`
/// in `fold(source)`.
pub fn map_folded_offset(source: &str, folded: &str, folded_offset: usize) -> usize {
    let char_index = folded[..folded_offset].chars().count();
    source
        .char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(source.len())
}
