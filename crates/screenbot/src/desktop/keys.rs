use rdev::Key;

/// Resolve a key name as written after `press` (already lowercased or not).
pub fn key_from_name(name: &str) -> Option<Key> {
    let name = name.trim().to_lowercase();
    let key = match name.as_str() {
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "insert" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "page_up" => Key::PageUp,
        "pagedown" | "page_down" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "shift" => Key::ShiftLeft,
        "ctrl" | "control" => Key::ControlLeft,
        "alt" => Key::Alt,
        "win" | "cmd" | "command" | "meta" | "super" => Key::MetaLeft,
        "capslock" => Key::CapsLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => {
            let mut chars = name.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => key_for_char(c).map(|(key, _)| key),
                _ => None,
            };
        }
    };
    Some(key)
}

/// Key and shift state producing `c` on a US layout
pub fn key_for_char(c: char) -> Option<(Key, bool)> {
    if c.is_ascii_alphabetic() {
        let key = letter_key(c.to_ascii_lowercase())?;
        return Some((key, c.is_ascii_uppercase()));
    }
    let mapped = match c {
        '0' => (Key::Num0, false),
        '1' => (Key::Num1, false),
        '2' => (Key::Num2, false),
        '3' => (Key::Num3, false),
        '4' => (Key::Num4, false),
        '5' => (Key::Num5, false),
        '6' => (Key::Num6, false),
        '7' => (Key::Num7, false),
        '8' => (Key::Num8, false),
        '9' => (Key::Num9, false),
        ')' => (Key::Num0, true),
        '!' => (Key::Num1, true),
        '@' => (Key::Num2, true),
        '#' => (Key::Num3, true),
        '$' => (Key::Num4, true),
        '%' => (Key::Num5, true),
        '^' => (Key::Num6, true),
        '&' => (Key::Num7, true),
        '*' => (Key::Num8, true),
        '(' => (Key::Num9, true),
        ' ' => (Key::Space, false),
        '\n' => (Key::Return, false),
        '\t' => (Key::Tab, false),
        '-' => (Key::Minus, false),
        '_' => (Key::Minus, true),
        '=' => (Key::Equal, false),
        '+' => (Key::Equal, true),
        '[' => (Key::LeftBracket, false),
        '{' => (Key::LeftBracket, true),
        ']' => (Key::RightBracket, false),
        '}' => (Key::RightBracket, true),
        ';' => (Key::SemiColon, false),
        ':' => (Key::SemiColon, true),
        '\'' => (Key::Quote, false),
        '"' => (Key::Quote, true),
        '\\' => (Key::BackSlash, false),
        '|' => (Key::BackSlash, true),
        ',' => (Key::Comma, false),
        '<' => (Key::Comma, true),
        '.' => (Key::Dot, false),
        '>' => (Key::Dot, true),
        '/' => (Key::Slash, false),
        '?' => (Key::Slash, true),
        '`' => (Key::BackQuote, false),
        '~' => (Key::BackQuote, true),
        _ => return None,
    };
    Some(mapped)
}

fn letter_key(c: char) -> Option<Key> {
    let key = match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        _ => return None,
    };
    Some(key)
}
