use ratatui::style::Color;

/// Colors shared by every view. The accent is what `t` cycles through.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub foreground: Color,
    pub muted: Color,
    pub info: Color,
    pub warning: Color,
    pub error: Color,
    pub background_secondary: Color,
    pub selection: Color,
}

const fn theme(name: &'static str, accent: Color) -> Theme {
    Theme {
        name,
        accent,
        foreground: Color::Indexed(252),
        muted: Color::Indexed(243),
        info: Color::Indexed(81),
        warning: Color::Indexed(214),
        error: Color::Indexed(203),
        background_secondary: Color::Indexed(235),
        selection: Color::Indexed(238),
    }
}

pub const THEMES: [Theme; 6] = [
    theme("ember", Color::Indexed(208)),
    theme("rose", Color::Indexed(205)),
    theme("lagoon", Color::Indexed(39)),
    theme("moss", Color::Indexed(77)),
    theme("iris", Color::Indexed(141)),
    theme("sand", Color::Indexed(222)),
];

pub fn theme_count() -> usize {
    THEMES.len()
}

/// The theme at `index`, wrapping around.
pub fn get(index: usize) -> &'static Theme {
    &THEMES[index % THEMES.len()]
}
