//! Render options.

use serde::{Deserialize, Serialize};

/// Flags controlling what the notebook renderer shows.
///
/// Field names serialize in camelCase so they line up with the attribute
/// names accepted by the `::notebook` directive (`hideCode`, `showOutputs`,
/// ...). Missing fields take their defaults when deserializing.
///
/// # Examples
///
/// ```
/// use notebook_mdx_core::RenderOptions;
///
/// let options = RenderOptions::default()
///     .with_hide_code(true)
///     .with_interactive(false);
/// assert!(options.hide_code);
/// assert!(options.show_outputs);
/// assert!(!options.interactive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Omit code cell inputs (outputs are still shown)
    pub hide_code: bool,
    /// Render code cell outputs
    pub show_outputs: bool,
    /// Show `In [n]:` / `Out[n]:` prompts
    pub show_cell_numbers: bool,
    /// Show the cell language label on code inputs
    pub show_language_indicators: bool,
    /// Hand chart specs to the chart engine instead of the static fallback
    pub interactive: bool,
    /// Add a copy button to code inputs
    pub show_copy_button: bool,
    /// Number the lines of code inputs
    pub show_line_numbers: bool,
}

impl Default for RenderOptions {
    #[inline]
    fn default() -> Self {
        Self {
            hide_code: false,
            show_outputs: true,
            show_cell_numbers: true,
            show_language_indicators: true,
            interactive: true,
            show_copy_button: false,
            show_line_numbers: false,
        }
    }
}

impl RenderOptions {
    /// Set whether code inputs are hidden
    #[inline]
    #[must_use = "returns a new RenderOptions with hide_code set"]
    pub const fn with_hide_code(mut self, hide_code: bool) -> Self {
        self.hide_code = hide_code;
        self
    }

    /// Set whether outputs are rendered
    #[inline]
    #[must_use = "returns a new RenderOptions with show_outputs set"]
    pub const fn with_show_outputs(mut self, show_outputs: bool) -> Self {
        self.show_outputs = show_outputs;
        self
    }

    /// Set whether execution prompts are shown
    #[inline]
    #[must_use = "returns a new RenderOptions with show_cell_numbers set"]
    pub const fn with_show_cell_numbers(mut self, show_cell_numbers: bool) -> Self {
        self.show_cell_numbers = show_cell_numbers;
        self
    }

    /// Set whether language labels are shown
    #[inline]
    #[must_use = "returns a new RenderOptions with show_language_indicators set"]
    pub const fn with_show_language_indicators(mut self, show: bool) -> Self {
        self.show_language_indicators = show;
        self
    }

    /// Set whether charts use the chart engine
    #[inline]
    #[must_use = "returns a new RenderOptions with interactive set"]
    pub const fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Set whether code inputs get a copy button
    #[inline]
    #[must_use = "returns a new RenderOptions with show_copy_button set"]
    pub const fn with_show_copy_button(mut self, show_copy_button: bool) -> Self {
        self.show_copy_button = show_copy_button;
        self
    }

    /// Set whether code inputs are line-numbered
    #[inline]
    #[must_use = "returns a new RenderOptions with show_line_numbers set"]
    pub const fn with_show_line_numbers(mut self, show_line_numbers: bool) -> Self {
        self.show_line_numbers = show_line_numbers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert!(!options.hide_code);
        assert!(options.show_outputs);
        assert!(options.show_cell_numbers);
        assert!(options.show_language_indicators);
        assert!(options.interactive);
        assert!(!options.show_copy_button);
        assert!(!options.show_line_numbers);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"hideCode": true, "showCellNumbers": false}"#).unwrap();
        assert!(options.hide_code);
        assert!(!options.show_cell_numbers);
        assert!(options.show_outputs, "unspecified fields use defaults");
        assert!(options.interactive, "unspecified fields use defaults");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(RenderOptions::default()).unwrap();
        assert_eq!(json["showLanguageIndicators"], true);
        assert_eq!(json["showCopyButton"], false);
    }
}
