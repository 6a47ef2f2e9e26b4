pub mod view;

pub use view::ViewSupervisor;
