//! Category-name normalization.

/// Maps Latin-1 accented letters to their ASCII base letter.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
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
        'ñ' => 'n',
        'Ñ' => 'N',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

fn is_separator(c: char) -> bool {
    c.is_ascii_whitespace() || c == '-' || c == '_'
}

/// Normalizes a category label into a mapping key.
///
/// `"Calçado Esportivo"` and `"calcado-esportivo"` both become
/// `"calcado_esportivo"`. Idempotent.
pub fn normalize_category(name: &str) -> String {
    let kept: String = name
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_alphanumeric() || is_separator(*c))
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if is_separator(c) {
            if !in_separator {
                out.push('_');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}
