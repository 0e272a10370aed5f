pub mod console;
pub mod pipeline_panel;
pub mod plot_view;
pub mod preferences_dialog;
pub mod project_tree;
pub mod theme;
pub mod toolbar;
