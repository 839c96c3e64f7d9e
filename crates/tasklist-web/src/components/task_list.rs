use tasklist_core::TaskId;
use tasklist_core::view::ItemView;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

use super::TaskRow;

#[derive(Properties, PartialEq)]
pub struct TaskListProps {
  pub items:         Vec<ItemView>,
  pub dragging:      Option<TaskId>,
  pub on_done:       Callback<TaskId>,
  pub on_delete:     Callback<TaskId>,
  pub on_drag_start: Callback<TaskId>,
  pub on_drag_over:  Callback<TaskId>,
  pub on_drag_end:   Callback<()>
}

#[function_component(TaskList)]
pub fn task_list(
  props: &TaskListProps
) -> Html {
  if props.items.is_empty() {
    return html! {
        <ul class="task-list">
            <li class="task-empty">{ "No tasks" }</li>
        </ul>
    };
  }

  html! {
      <ul class="task-list">
          {
              for props.items.iter().cloned().map(|item| {
                  let id = item.id;
                  html! {
                  <TaskRow
                      key={id.0.to_string()}
                      dragging={props.dragging == Some(id)}
                      item={item}
                      on_done={props.on_done.clone()}
                      on_delete={props.on_delete.clone()}
                      on_drag_start={props.on_drag_start.clone()}
                      on_drag_over={props.on_drag_over.clone()}
                      on_drag_end={props.on_drag_end.clone()}
                  />
                  }
              })
          }
      </ul>
  }
}
