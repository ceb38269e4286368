//! macOS virtual keycode to key name translation
//!
//! Keycode values are the `kVK_*` constants from Carbon's `Events.h`
//! (HIToolbox framework). The same table decides which key names
//! [`Hotkey::parse`](super::Hotkey::parse) accepts, so every parsed hotkey
//! can be produced by the event tap.

/// Keycode and key name of every non-modifier key a hotkey can use
const KEYS: &[(u16, &str)] = &[
    // Letters (ANSI key positions, not ASCII)
    (0x00, "a"),
    (0x0B, "b"),
    (0x08, "c"),
    (0x02, "d"),
    (0x0E, "e"),
    (0x03, "f"),
    (0x05, "g"),
    (0x04, "h"),
    (0x22, "i"),
    (0x26, "j"),
    (0x28, "k"),
    (0x25, "l"),
    (0x2E, "m"),
    (0x2D, "n"),
    (0x1F, "o"),
    (0x23, "p"),
    (0x0C, "q"),
    (0x0F, "r"),
    (0x01, "s"),
    (0x11, "t"),
    (0x20, "u"),
    (0x09, "v"),
    (0x0D, "w"),
    (0x07, "x"),
    (0x10, "y"),
    (0x06, "z"),

    // Digits
    (0x1D, "0"),
    (0x12, "1"),
    (0x13, "2"),
    (0x14, "3"),
    (0x15, "4"),
    (0x17, "5"),
    (0x16, "6"),
    (0x1A, "7"),
    (0x1C, "8"),
    (0x19, "9"),

    // Control keys
    (0x24, "enter"),
    (0x35, "escape"),
    (0x33, "backspace"),
    (0x30, "tab"),
    (0x31, "space"),
    (0x73, "home"),
    (0x74, "pageup"),
    (0x75, "delete"),
    (0x77, "end"),
    (0x79, "pagedown"),

    // Arrows
    (0x7B, "left"),
    (0x7C, "right"),
    (0x7D, "down"),
    (0x7E, "up"),

    // Function keys
    (0x7A, "f1"),
    (0x78, "f2"),
    (0x63, "f3"),
    (0x76, "f4"),
    (0x60, "f5"),
    (0x61, "f6"),
    (0x62, "f7"),
    (0x64, "f8"),
    (0x65, "f9"),
    (0x6D, "f10"),
    (0x67, "f11"),
    (0x6F, "f12"),
    (0x69, "f13"),
    (0x6B, "f14"),
    (0x71, "f15"),

    // Punctuation
    (0x1B, "-"),
    (0x18, "="),
    (0x21, "["),
    (0x1E, "]"),
    (0x2A, "\\"),
    (0x29, ";"),
    (0x27, "'"),
    (0x32, "`"),
    (0x2B, ","),
    (0x2F, "."),
    (0x2C, "/"),
];

/// Translate a macOS virtual keycode to a hotkey key name.
///
/// Returns `None` for modifier keys and codes without a name.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn key_name(keycode: u16) -> Option<&'static str> {
    KEYS.iter().find(|(code, _)| *code == keycode).map(|(_, name)| *name)
}

/// Whether `name` is a canonical key name with a keycode
pub fn is_key_name(name: &str) -> bool {
    KEYS.iter().any(|(_, known)| *known == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Hotkey;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(key_name(0x00), Some("a"));
        assert_eq!(key_name(0x25), Some("l"));
        assert_eq!(key_name(0x12), Some("1"));
        assert_eq!(key_name(0x1D), Some("0"));
    }

    #[test]
    fn test_modifier_keycodes_have_no_name() {
        // kVK_Command, kVK_Shift, kVK_Option, kVK_Control
        for code in [0x37, 0x38, 0x3A, 0x3B] {
            assert_eq!(key_name(code), None);
        }
    }

    #[test]
    fn test_names_parse_as_hotkey_keys() {
        for code in 0u16..0x80 {
            if let Some(name) = key_name(code) {
                let hotkey = Hotkey::parse(&format!("ctrl+{name}")).unwrap();
                assert_eq!(hotkey.key(), name, "keycode {code:#x}");
            }
        }
    }

    #[test]
    fn test_known_names() {
        assert!(is_key_name("escape"));
        assert!(is_key_name("f15"));
        assert!(!is_key_name("esc"));
        assert!(!is_key_name("f20"));
        assert!(!is_key_name("numpad1"));
        assert!(!is_key_name("lamp"));
    }

    #[test]
    fn test_table_has_no_duplicates() {
        for (i, (code, name)) in KEYS.iter().enumerate() {
            assert!(KEYS[i + 1..].iter().all(|(c, n)| c != code && n != name), "{name}");
        }
    }
}
