// Domain layer - Dashboards, widgets and grid geometry
pub mod dashboard;
pub mod ids;
pub mod layout;
pub mod validation;
pub mod widget;
