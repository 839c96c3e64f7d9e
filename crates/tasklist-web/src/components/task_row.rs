use tasklist_core::TaskId;
use tasklist_core::datetime::format_due_date;
use tasklist_core::view::{
  DELETE_BUTTON_LABEL,
  ItemView
};
use web_sys::{
  DragEvent,
  KeyboardEvent,
  MouseEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskRowProps {
  pub item:          ItemView,
  pub dragging:      bool,
  pub on_done:       Callback<TaskId>,
  pub on_delete:     Callback<TaskId>,
  pub on_drag_start: Callback<TaskId>,
  pub on_drag_over:  Callback<TaskId>,
  pub on_drag_end:   Callback<()>
}

/// Click and Enter both activate a
/// button. Enter is consumed here so the
/// browser does not also synthesize a
/// click for the same press.
fn activate(
  id: TaskId,
  target: Callback<TaskId>
) -> (Callback<MouseEvent>, Callback<KeyboardEvent>)
{
  let on_click = {
    let target = target.clone();
    Callback::from(move |e: MouseEvent| {
      e.stop_propagation();
      target.emit(id);
    })
  };
  let on_key = Callback::from(
    move |e: KeyboardEvent| {
      if e.key() == "Enter" {
        e.prevent_default();
        e.stop_propagation();
        target.emit(id);
      }
    }
  );
  (on_click, on_key)
}

#[function_component(TaskRow)]
pub fn task_row(
  props: &TaskRowProps
) -> Html {
  let item = &props.item;
  let id = item.id;

  let (done_click, done_key) =
    activate(id, props.on_done.clone());
  let (delete_click, delete_key) =
    activate(id, props.on_delete.clone());

  let ondragstart = {
    let on_drag_start =
      props.on_drag_start.clone();
    Callback::from(move |e: DragEvent| {
      if let Some(data_transfer) =
        e.data_transfer()
      {
        if let Err(error) = data_transfer
          .set_data(
            "text/plain",
            &id.to_string()
          )
        {
          tracing::warn!(
            ?error,
            "failed writing drag data"
          );
        }
        data_transfer
          .set_effect_allowed("move");
      }
      on_drag_start.emit(id);
    })
  };

  let ondragover = {
    let on_drag_over =
      props.on_drag_over.clone();
    Callback::from(move |e: DragEvent| {
      e.prevent_default();
      on_drag_over.emit(id);
    })
  };

  let ondrop =
    Callback::from(|e: DragEvent| {
      e.prevent_default();
    });

  let ondragend = {
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(move |_: DragEvent| {
      on_drag_end.emit(());
    })
  };

  let due = item
    .due_date
    .map(format_due_date)
    .unwrap_or_default();
  let done_label = if item.done {
    "Undo"
  } else {
    "Done"
  };
  let title_id = item.title_element_id();
  let description_id =
    item.description_element_id();

  html! {
      <li
          class={classes!(item.classes(), props.dragging.then_some("dragging"))}
          draggable="true"
          role="listitem"
          aria-labelledby={title_id.clone()}
          aria-describedby={description_id.clone()}
          aria-checked={item.done.to_string()}
          {ondragstart}
          {ondragover}
          {ondrop}
          {ondragend}
      >
          <div class="task-main">
              <div class="task-title" id={title_id}>{ &item.title }</div>
              <div class="task-subtitle" id={description_id}>{ &item.description }</div>
              <div class="task-meta">
                  <span class={classes!("badge", format!("priority-{}", item.priority.as_str()))}>
                      { item.priority.as_str() }
                  </span>
                  {
                      if due.is_empty() {
                          html! {}
                      } else {
                          html! { <span class="badge">{ format!("due:{due}") }</span> }
                      }
                  }
                  {
                      for item.tags.iter().map(|tag| html! {
                          <span class="badge tag-badge">{ format!("#{tag}") }</span>
                      })
                  }
              </div>
          </div>
          <div class="task-actions">
              <button
                  class="btn ok"
                  aria-label={item.done_button_label()}
                  onclick={done_click}
                  onkeydown={done_key}
              >
                  { done_label }
              </button>
              <button
                  class="btn danger"
                  aria-label={DELETE_BUTTON_LABEL}
                  onclick={delete_click}
                  onkeydown={delete_key}
              >
                  { "Delete" }
              </button>
          </div>
      </li>
  }
}
