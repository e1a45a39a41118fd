//! paragraph-level filtering
use lazy_static::lazy_static;

use super::Filter;

lazy_static! {
    /// Paragraphs starting with one of these are page furniture, not article text.
    static ref BOILERPLATE_PREFIXES: Vec<&'static str> = vec![
        "No media source currently available",
        "Already have an account?",
        "Log in",
        "Sign up",
        "Not a registered user?",
        "The code has been copied to your clipboard",
        "The URL has been copied to your clipboard",
        "Embed",
        "0:",
        "share",
        "Telegram Banner",
        // amh: "Listen to the list from the attached audio file."
        "ዝርዝሩን ከተያያዘው የድምጽ ፋይል ያድምጡ፡፡",
        // lao: "Read more in English"
        "ອ່ານຂ່າວນີ້ຕື່ມເປັນພາສາອັງກິດ",
        // tir: "The full content can be heard here"
        "ምሉእ ትሕዝቶ ኣብዚ ምስማዕ ይክኣል::",
        // ukr: "See also:"
        "Дивіться також:",
        // uzb: "Voice of America -"
        "\"Amerika Ovozi\" -",
        "Avec Reuters",
        "Avec AFP",
        // por: "Click here to listen"
        "Clique aqui para ouvir",
        "- Clique aqui para ouvir",
        "- Clique para ouvir",
        "-Clique para ouvir",
        "Clique na barra sobre este texto",
    ];
}

/// Characters that behave as spaces but aren't considered whitespace by [char::is_whitespace].
const SPACE_CHARS: [char; 6] = [
    '\u{1361}', // ethiopic wordspace
    '\u{200b}', // zero width space
    '\u{2408}', // symbol for backspace
    '\u{2420}', // symbol for space
    '\u{303f}', // ideographic half fill space
    '\u{feff}', // zero width no-break space
];

#[inline]
fn is_space(c: char) -> bool {
    c.is_whitespace() || SPACE_CHARS.contains(&c)
}

/// Rejects empty and boilerplate paragraphs.
#[derive(Default)]
pub struct Boilerplate;

impl Filter<&str> for Boilerplate {
    fn detect(&self, paragraph: &str) -> bool {
        let collapsed = paragraph.split(is_space).filter(|w| !w.is_empty());
        let collapsed: Vec<&str> = collapsed.collect();
        if collapsed.is_empty() {
            return false;
        }
        let collapsed = collapsed.join(" ");
        !BOILERPLATE_PREFIXES
            .iter()
            .any(|prefix| collapsed.starts_with(prefix))
    }
}

/// Split raw paragraphs on newlines (left over by html to text conversion),
/// trim them and drop empty or boilerplate ones.
///
/// Order is preserved.
pub fn clean_paragraphs(raw: &[String]) -> Vec<String> {
    let filter = Boilerplate;
    raw.iter()
        .flat_map(|p| p.split('\n'))
        .map(|p| p.trim_matches(is_space))
        .filter(|p| filter.detect(p))
        .map(str::to_string)
        .collect()
}
