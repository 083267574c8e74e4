use ratatui::style::{Color, Modifier, Style};

#[allow(dead_code)]
pub struct Theme {
    pub bg_selected: Color,

    pub text: Color,
    pub text_dim: Color,
    pub text_selected: Color,
    pub text_header: Color,
    pub text_directory: Color,

    pub border: Color,
    pub border_active: Color,

    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dracula()
    }
}

impl Theme {
    /// Classic Norton Commander blue theme
    #[allow(dead_code)]
    pub fn classic_blue() -> Self {
        Self {
            bg_selected: Color::Cyan,
            text: Color::White,
            text_dim: Color::Gray,
            text_selected: Color::Black,
            text_header: Color::Yellow,
            text_directory: Color::White,
            border: Color::Cyan,
            border_active: Color::Yellow,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
        }
    }

    /// Dracula (default); RGB when the terminal advertises true color,
    /// otherwise the 256-color approximation.
    pub fn dracula() -> Self {
        let truecolor = std::env::var("COLORTERM")
            .map(|v| v == "truecolor" || v == "24bit")
            .unwrap_or(false);
        if truecolor {
            Self::dracula_rgb()
        } else {
            Self::dracula_256()
        }
    }

    fn dracula_rgb() -> Self {
        Self {
            bg_selected: Color::Rgb(68, 71, 90),
            text: Color::Rgb(248, 248, 242),
            text_dim: Color::Rgb(98, 114, 164),
            text_selected: Color::Rgb(248, 248, 242),
            text_header: Color::Rgb(189, 147, 249),
            text_directory: Color::Rgb(139, 233, 253),
            border: Color::Rgb(42, 45, 62),
            border_active: Color::Rgb(189, 147, 249),
            warning: Color::Rgb(241, 250, 140),
            error: Color::Rgb(255, 85, 85),
            info: Color::Rgb(139, 233, 253),
        }
    }

    fn dracula_256() -> Self {
        Self {
            bg_selected: Color::Indexed(238),
            text: Color::Indexed(255),
            text_dim: Color::Indexed(103),
            text_selected: Color::Indexed(255),
            text_header: Color::Indexed(141),
            text_directory: Color::Indexed(87),
            border: Color::Indexed(237),
            border_active: Color::Indexed(141),
            warning: Color::Indexed(228),
            error: Color::Indexed(203),
            info: Color::Indexed(87),
        }
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    pub fn selected_style(&self) -> Style {
        Style::default().fg(self.text_selected).bg(self.bg_selected)
    }

    pub fn directory_style(&self) -> Style {
        Style::default()
            .fg(self.text_directory)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.text_header)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.border_active)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning).add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}
