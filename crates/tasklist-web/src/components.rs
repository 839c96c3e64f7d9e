mod filter_bar;
mod task_form;
mod task_list;
mod task_row;

pub use filter_bar::FilterBar;
pub use task_form::TaskForm;
pub use task_list::TaskList;
pub use task_row::TaskRow;
