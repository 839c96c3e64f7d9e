use tasklist_core::{
  Priority,
  TaskDraft
};
use yew::{
  Callback,
  Html,
  Properties,
  SubmitEvent,
  TargetCast,
  function_component,
  html,
  use_state
};

#[derive(Properties, PartialEq)]
pub struct TaskFormProps {
  /// Returns true when the draft was
  /// accepted; the form clears only then.
  pub on_submit: Callback<TaskDraft, bool>
}

#[function_component(TaskForm)]
pub fn task_form(
  props: &TaskFormProps
) -> Html {
  let draft = use_state(TaskDraft::default);

  let on_title = {
    let draft = draft.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlInputElement
          >()
        {
          let mut next = (*draft).clone();
          next.title = input.value();
          draft.set(next);
        }
      }
    )
  };

  let on_description = {
    let draft = draft.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlTextAreaElement
          >()
        {
          let mut next = (*draft).clone();
          next.description = input.value();
          draft.set(next);
        }
      }
    )
  };

  let on_tags = {
    let draft = draft.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlInputElement
          >()
        {
          let mut next = (*draft).clone();
          next.tags_input = input.value();
          draft.set(next);
        }
      }
    )
  };

  let on_due = {
    let draft = draft.clone();
    Callback::from(
      move |e: web_sys::Event| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlInputElement
          >()
        {
          let mut next = (*draft).clone();
          next.due_date_input = input.value();
          draft.set(next);
        }
      }
    )
  };

  let on_priority = {
    let draft = draft.clone();
    Callback::from(
      move |e: web_sys::Event| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlSelectElement
          >()
        {
          match input.value().parse() {
            | Ok(priority) => {
              let mut next =
                (*draft).clone();
              next.priority = priority;
              draft.set(next);
            }
            | Err(error) => {
              tracing::warn!(
                %error,
                "ignoring priority option"
              );
            }
          }
        }
      }
    )
  };

  let onsubmit = {
    let draft = draft.clone();
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |e: SubmitEvent| {
        e.prevent_default();
        if on_submit.emit((*draft).clone())
        {
          draft.set(TaskDraft::default());
        }
      }
    )
  };

  html! {
      <form class="task-form" {onsubmit}>
          <input
              type="text"
              placeholder="Title"
              value={draft.title.clone()}
              oninput={on_title}
          />
          <textarea
              placeholder="Description"
              value={draft.description.clone()}
              oninput={on_description}
          />
          <input
              type="text"
              placeholder="Tags, comma separated"
              value={draft.tags_input.clone()}
              oninput={on_tags}
          />
          <input
              type="date"
              value={draft.due_date_input.clone()}
              onchange={on_due}
          />
          <select onchange={on_priority}>
              {
                  for Priority::ALL.iter().map(|priority| html! {
                      <option
                          value={priority.as_str()}
                          selected={*priority == draft.priority}
                      >
                          { priority.as_str() }
                      </option>
                  })
              }
          </select>
          <button class="btn" type="submit">{ "Add Task" }</button>
      </form>
  }
}
