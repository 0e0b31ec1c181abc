//! External collaborators run after the packages are in place: pipx tools,
//! the shell prompt, the browser hook and the setup scripts.

pub mod browser;
pub mod pipx;
pub mod prompt;
pub mod scripts;

pub use browser::{HookResult, run_browser_hook};
pub use pipx::ensure_tools;
pub use prompt::ensure_prompt;
pub use scripts::{SCRIPT_ORDER, ScriptReport, run_scripts};
