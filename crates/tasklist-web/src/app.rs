use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use gloo::events::EventListener;
use gloo::timers::future::TimeoutFuture;
use tasklist_core::datetime::{
  DEFAULT_TIMEZONE,
  today_in
};
use tasklist_core::filter::{
  DueBucket,
  PriorityFilter,
  TagFilter
};
use tasklist_core::{
  App as TaskApp,
  DEFAULT_TASKS_KEY,
  Event,
  Moment,
  Outcome,
  TaskDraft,
  TaskId,
  TaskStore,
  Timing
};
use yew::{
  Callback,
  Html,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_mut_ref
};

use crate::components::{
  FilterBar,
  TaskForm,
  TaskList
};
use crate::storage::LocalStorage;

/// Browser event host around the task
/// app. Queued work runs from a single
/// pending timeout; a newer arm bumps
/// `generation` so stale timeouts exit.
struct WebHost {
  app:        TaskApp<LocalStorage>,
  started_ms: f64,
  generation: u64
}

impl WebHost {
  fn start() -> Self {
    let started_ms = js_sys::Date::now();
    let store = TaskStore::load(
      LocalStorage,
      DEFAULT_TASKS_KEY
    );
    let app = TaskApp::start(
      store,
      Timing::default(),
      moment(started_ms)
    );
    Self {
      app,
      started_ms,
      generation: 0
    }
  }

  fn handle(
    &mut self,
    event: Event
  ) -> Outcome {
    let now = moment(self.started_ms);
    self.app.handle(event, now)
  }

  fn advance(&mut self) -> bool {
    let now = moment(self.started_ms);
    self.app.advance(now)
  }

  fn wait_ms(&self) -> Option<u32> {
    let deadline =
      self.app.next_deadline()?;
    let elapsed =
      moment(self.started_ms).elapsed;
    let wait =
      deadline.saturating_sub(elapsed);
    Some(
      u32::try_from(wait.as_millis())
        .unwrap_or(u32::MAX)
    )
  }
}

fn moment(started_ms: f64) -> Moment {
  let now_ms = js_sys::Date::now();
  let elapsed_ms =
    (now_ms - started_ms).max(0.0);
  Moment {
    elapsed:  Duration::from_millis(
      elapsed_ms as u64
    ),
    epoch_ms: now_ms as u64,
    today:    today_in(
      DEFAULT_TIMEZONE,
      Utc::now()
    )
  }
}

/// Sleeps until the app's next deadline,
/// runs due jobs, and re-arms.
fn arm(
  host: Rc<RefCell<WebHost>>,
  redraw: Callback<()>
) {
  let (generation, wait) = {
    let mut guard = host.borrow_mut();
    guard.generation =
      guard.generation.wrapping_add(1);
    (guard.generation, guard.wait_ms())
  };
  let Some(wait) = wait else {
    return;
  };

  wasm_bindgen_futures::spawn_local(
    async move {
      TimeoutFuture::new(wait).await;
      let changed = {
        let mut guard = host.borrow_mut();
        if guard.generation != generation
        {
          return;
        }
        guard.advance()
      };
      if changed {
        redraw.emit(());
      }
      arm(host, redraw);
    }
  );
}

#[function_component(App)]
pub fn app() -> Html {
  let host = use_mut_ref(WebHost::start);
  let force = use_force_update();
  let redraw = Callback::from(
    move |()| force.force_update()
  );

  {
    let host = host.clone();
    let redraw = redraw.clone();
    use_effect_with((), move |_| {
      arm(host.clone(), redraw);
      let listener = web_sys::window()
        .map(|window| {
          EventListener::new(
            &window,
            "pagehide",
            move |_| {
              host.borrow().app.shutdown();
            }
          )
        });
      move || drop(listener)
    });
  }

  let dispatch = {
    let host = host.clone();
    let redraw = redraw.clone();
    Callback::from(
      move |event: Event| -> Outcome {
        let outcome =
          host.borrow_mut().handle(event);
        arm(host.clone(), redraw.clone());
        redraw.emit(());
        outcome
      }
    )
  };

  let on_submit = {
    let dispatch = dispatch.clone();
    Callback::from(
      move |draft: TaskDraft| -> bool {
        match dispatch
          .emit(Event::Submit(draft))
        {
          | Outcome::Created(_) => true,
          | Outcome::Rejected(error) => {
            gloo::dialogs::alert(
              &error.to_string()
            );
            false
          }
          | _ => false
        }
      }
    )
  };

  let event_cb = |make: fn(TaskId) -> Event| {
    let dispatch = dispatch.clone();
    Callback::from(move |id: TaskId| {
      dispatch.emit(make(id));
    })
  };
  let on_done = event_cb(Event::ToggleDone);
  let on_delete = event_cb(Event::Delete);
  let on_drag_start =
    event_cb(Event::DragStart);
  let on_drag_over =
    event_cb(Event::DragOver);
  let on_drag_end = {
    let dispatch = dispatch.clone();
    Callback::from(move |()| {
      dispatch.emit(Event::DragEnd);
    })
  };

  let on_query = {
    let dispatch = dispatch.clone();
    Callback::from(move |q: String| {
      dispatch.emit(Event::SetQuery(q));
    })
  };
  let on_priority = {
    let dispatch = dispatch.clone();
    Callback::from(
      move |p: PriorityFilter| {
        dispatch
          .emit(Event::SetPriority(p));
      }
    )
  };
  let on_tag = {
    let dispatch = dispatch.clone();
    Callback::from(move |t: TagFilter| {
      dispatch.emit(Event::SetTag(t));
    })
  };
  let on_due = {
    let dispatch = dispatch.clone();
    Callback::from(move |d: DueBucket| {
      dispatch.emit(Event::SetDue(d));
    })
  };

  let guard = host.borrow();
  let items =
    guard.app.view().items().to_vec();
  let tag_options =
    guard.app.catalog().options();
  let criteria =
    guard.app.criteria().clone();
  let dragging = guard.app.dragging();
  drop(guard);

  html! {
      <main class="container">
          <h1>{ "Tasks" }</h1>
          <TaskForm {on_submit} />
          <FilterBar
              criteria={criteria}
              tag_options={tag_options}
              {on_query}
              {on_priority}
              {on_tag}
              {on_due}
          />
          <TaskList
              items={items}
              dragging={dragging}
              {on_done}
              {on_delete}
              {on_drag_start}
              {on_drag_over}
              {on_drag_end}
          />
      </main>
  }
}
