//! Package request sets.
//!
//! Base names are grouped into categories. Per-variant differences are a
//! declarative table of overrides (rename or omit) applied once when a
//! category is materialized, never ad hoc at install time.

use crate::common::distro::Variant;

/// Named group of packages installed together in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    General,
    GuiApps,
    CliTools,
    DistroSpecific,
    Desktop,
}

impl Category {
    /// Installation order.
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::GuiApps,
        Category::CliTools,
        Category::DistroSpecific,
        Category::Desktop,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::GuiApps => "gui_apps",
            Self::CliTools => "cli_tools",
            Self::DistroSpecific => "distro_specific",
            Self::Desktop => "desktop",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::General => "General packages",
            Self::GuiApps => "GUI applications",
            Self::CliTools => "CLI tools",
            Self::DistroSpecific => "Distribution packages",
            Self::Desktop => "Desktop environment",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Install under a different name on this variant.
    Rename(&'static str),
    /// Not installed on this variant.
    Omit,
}

#[derive(Debug, Clone, Copy)]
pub struct PackageOverride {
    pub variant: Variant,
    pub package: &'static str,
    pub action: Override,
}

const fn rename(variant: Variant, package: &'static str, to: &'static str) -> PackageOverride {
    PackageOverride {
        variant,
        package,
        action: Override::Rename(to),
    }
}

const fn omit(variant: Variant, package: &'static str) -> PackageOverride {
    PackageOverride {
        variant,
        package,
        action: Override::Omit,
    }
}

// =============================================================================
// Standard request sets
// =============================================================================

const GENERAL: &[&str] = &[
    "git",
    "curl",
    "wget",
    "unzip",
    "rsync",
    "jq",
    "build-essential",
    "cmake",
    "meson",
    "ninja-build",
    "pkg-config",
    "golang-go",
    "pipx",
    "python3-pip",
    "xdg-user-dirs",
];

const GUI_APPS: &[&str] = &[
    "kitty",
    "wezterm",
    "firefox",
    "nautilus",
    "pavucontrol",
    "blueman",
    "network-manager-gnome",
    "nwg-look",
    "qt6ct",
];

const CLI_TOOLS: &[&str] = &[
    "fzf", "ripgrep", "bat", "eza", "zoxide", "btop", "fastfetch", "neovim", "tmux",
];

const DESKTOP: &[&str] = &[
    "hyprland",
    "hyprpaper",
    "hypridle",
    "hyprlock",
    "xdg-desktop-portal-hyprland",
    "xdg-desktop-portal-gtk",
    "waybar",
    "rofi",
    "swaync",
    "wlogout",
    "grim",
    "slurp",
    "wl-clipboard",
    "brightnessctl",
    "libnotify-bin",
    "qt6-wayland",
    "polkit-kde-agent-1",
];

const BASE: &[(Category, &[&str])] = &[
    (Category::General, GENERAL),
    (Category::GuiApps, GUI_APPS),
    (Category::CliTools, CLI_TOOLS),
    (Category::Desktop, DESKTOP),
];

const DISTRO_SPECIFIC: &[(Variant, &[&str])] = &[
    (
        Variant::Ubuntu,
        &["software-properties-common", "ubuntu-restricted-extras"],
    ),
    (Variant::Debian, &["flatpak", "firmware-linux-free"]),
    (Variant::Generic, &["flatpak"]),
];

const OVERRIDES: &[PackageOverride] = &[
    rename(Variant::Debian, "firefox", "firefox-esr"),
    // fastfetch comes from the prebuilt installer where the archive lacks it
    omit(Variant::Ubuntu, "fastfetch"),
    omit(Variant::Generic, "fastfetch"),
    // wezterm needs the signed repository that is only registered on Ubuntu
    omit(Variant::Generic, "wezterm"),
];

/// One category resolved for a variant: final names, in order, no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSet {
    pub category: Category,
    pub packages: Vec<String>,
}

impl RequestSet {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Declarative package tables.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    base: &'static [(Category, &'static [&'static str])],
    distro_specific: &'static [(Variant, &'static [&'static str])],
    overrides: &'static [PackageOverride],
}

impl Catalog {
    pub const fn new(
        base: &'static [(Category, &'static [&'static str])],
        distro_specific: &'static [(Variant, &'static [&'static str])],
        overrides: &'static [PackageOverride],
    ) -> Self {
        Self {
            base,
            distro_specific,
            overrides,
        }
    }

    /// The built-in desktop package set.
    pub const fn standard() -> Self {
        Self::new(BASE, DISTRO_SPECIFIC, OVERRIDES)
    }

    /// Base names of a category before any override.
    pub fn base_names(&self, category: Category, variant: Variant) -> &'static [&'static str] {
        let table = match category {
            Category::DistroSpecific => self
                .distro_specific
                .iter()
                .find(|(v, _)| *v == variant)
                .map(|(_, names)| *names),
            _ => self
                .base
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, names)| *names),
        };
        table.unwrap_or(&[])
    }

    /// Apply this variant's override to a single name. `None` means omitted.
    pub fn resolve(&self, variant: Variant, name: &str) -> Option<String> {
        let action = self
            .overrides
            .iter()
            .find(|o| o.variant == variant && o.package == name)
            .map(|o| o.action);
        match action {
            Some(Override::Omit) => None,
            Some(Override::Rename(to)) => Some(to.to_string()),
            None => Some(name.to_string()),
        }
    }

    /// Resolve a category for `variant`, appending `extras` from the
    /// config. The first occurrence of a name wins.
    pub fn materialize(
        &self,
        category: Category,
        variant: Variant,
        extras: &[String],
    ) -> RequestSet {
        let mut packages: Vec<String> = Vec::new();
        let names = self
            .base_names(category, variant)
            .iter()
            .copied()
            .chain(extras.iter().map(String::as_str));
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(resolved) = self.resolve(variant, name)
                && !packages.contains(&resolved)
            {
                packages.push(resolved);
            }
        }
        RequestSet { category, packages }
    }

    /// Names that are omitted on `variant`; shown to the operator so they
    /// know what to add by hand.
    pub fn omitted(&self, variant: Variant) -> Vec<&'static str> {
        self.overrides
            .iter()
            .filter(|o| o.variant == variant && o.action == Override::Omit)
            .map(|o| o.package)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
