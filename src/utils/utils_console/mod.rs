use colored::{Color, Colorize};

/// Prints the given string with the given color.
///
/// ## Example
/// ```
/// use kinopt::utils::utils_console::{console_print, PrintMode, PrintColor};
/// console_print("test", PrintMode::Print, PrintColor::Blue, false);
/// ```
pub fn console_print(s: &str, mode: PrintMode, color: PrintColor, bolded: bool) {
    let mut out = match color.get_color() {
        None => { s.normal() }
        Some(c) => { s.color(c) }
    };
    if bolded { out = out.bold(); }
    match mode {
        PrintMode::Println => { println!("{}", out); }
        PrintMode::Print => { print!("{}", out); }
    }
}

pub fn console_print_new_line() {
    console_print("\n", PrintMode::Print, PrintColor::None, false);
}

/// Println will cause a new line after each print, while Print will not.
#[derive(Clone, Debug)]
pub enum PrintMode {
    Println,
    Print
}

/// Defines color for a console print command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrintColor {
    None,
    Blue,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta
}
impl PrintColor {
    pub fn get_color(&self) -> Option<Color> {
        match self {
            PrintColor::None => { None }
            PrintColor::Blue => { Some(Color::Blue) }
            PrintColor::Green => { Some(Color::Green) }
            PrintColor::Red => { Some(Color::Red) }
            PrintColor::Yellow => { Some(Color::Yellow) }
            PrintColor::Cyan => { Some(Color::Cyan) }
            PrintColor::Magenta => { Some(Color::Magenta) }
        }
    }
}
