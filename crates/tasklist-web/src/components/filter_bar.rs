use tasklist_core::Priority;
use tasklist_core::filter::{
  DueBucket,
  FilterCriteria,
  PriorityFilter,
  TagFilter
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct FilterBarProps {
  pub criteria:    FilterCriteria,
  pub tag_options: Vec<String>,
  pub on_query:    Callback<String>,
  pub on_priority:
    Callback<PriorityFilter>,
  pub on_tag:      Callback<TagFilter>,
  pub on_due:      Callback<DueBucket>
}

fn select_value(
  e: &web_sys::Event
) -> Option<String> {
  e.target_dyn_into::<
    web_sys::HtmlSelectElement
  >()
  .map(|select| select.value())
}

#[function_component(FilterBar)]
pub fn filter_bar(
  props: &FilterBarProps
) -> Html {
  let oninput = {
    let on_query = props.on_query.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        if let Some(input) = e
          .target_dyn_into::<
            web_sys::HtmlInputElement
          >()
        {
          on_query.emit(input.value());
        }
      }
    )
  };

  let on_priority_change = {
    let on_priority =
      props.on_priority.clone();
    Callback::from(
      move |e: web_sys::Event| {
        let Some(value) = select_value(&e)
        else {
          return;
        };
        match value.parse() {
          | Ok(filter) => {
            on_priority.emit(filter)
          }
          | Err(error) => {
            tracing::warn!(
              %error,
              "ignoring priority filter"
            )
          }
        }
      }
    )
  };

  let on_tag_change = {
    let on_tag = props.on_tag.clone();
    Callback::from(
      move |e: web_sys::Event| {
        if let Some(value) =
          select_value(&e)
          && let Ok(filter) = value.parse()
        {
          on_tag.emit(filter);
        }
      }
    )
  };

  let on_due_change = {
    let on_due = props.on_due.clone();
    Callback::from(
      move |e: web_sys::Event| {
        let Some(value) = select_value(&e)
        else {
          return;
        };
        match value.parse() {
          | Ok(bucket) => on_due.emit(bucket),
          | Err(error) => {
            tracing::warn!(
              %error,
              "ignoring due filter"
            )
          }
        }
      }
    )
  };

  let priority_selected =
    props.criteria.priority.to_string();
  let tag_selected =
    props.criteria.tag.to_string();
  let due_selected =
    props.criteria.due.to_string();

  let priority_options = std::iter::once(
    PriorityFilter::All
  )
  .chain(
    Priority::ALL
      .iter()
      .copied()
      .map(PriorityFilter::Only)
  )
  .map(|filter| filter.to_string());

  let due_options = [
    DueBucket::All,
    DueBucket::Overdue,
    DueBucket::Today,
    DueBucket::Future
  ];

  html! {
      <div class="filter-bar">
          <input
              type="search"
              placeholder="Search"
              value={props.criteria.query.clone()}
              {oninput}
          />
          <select onchange={on_priority_change}>
              {
                  for priority_options.map(|value| html! {
                      <option
                          value={value.clone()}
                          selected={value == priority_selected}
                      >
                          { value.clone() }
                      </option>
                  })
              }
          </select>
          <select onchange={on_tag_change}>
              {
                  for props.tag_options.iter().map(|tag| html! {
                      <option
                          value={tag.clone()}
                          selected={*tag == tag_selected}
                      >
                          { tag.clone() }
                      </option>
                  })
              }
          </select>
          <select onchange={on_due_change}>
              {
                  for due_options.iter().map(|bucket| html! {
                      <option
                          value={bucket.as_str()}
                          selected={bucket.as_str() == due_selected}
                      >
                          { bucket.as_str() }
                      </option>
                  })
              }
          </select>
      </div>
  }
}
