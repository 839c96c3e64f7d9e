use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::trace;

use crate::task::{
  Priority,
  Task
};

const ALL: &str = "all";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum PriorityFilter {
  #[default]
  All,
  Only(Priority)
}

#[derive(
  Debug, Clone, PartialEq, Eq, Default,
)]
pub enum TagFilter {
  #[default]
  All,
  Only(String)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum DueBucket {
  #[default]
  All,
  Overdue,
  Today,
  Future
}

/// The four independent filter inputs.
/// A task is shown when every active
/// criterion passes.
#[derive(
  Debug, Clone, PartialEq, Eq, Default,
)]
pub struct FilterCriteria {
  pub query:    String,
  pub priority: PriorityFilter,
  pub tag:      TagFilter,
  pub due:      DueBucket
}

impl FilterCriteria {
  pub fn is_active(&self) -> bool {
    !self.query.is_empty()
      || self.priority
        != PriorityFilter::All
      || self.tag != TagFilter::All
      || self.due != DueBucket::All
  }
}

/// Derives the visible sequence from the
/// collection, keeping collection order.
#[tracing::instrument(skip(
  tasks, criteria
))]
pub fn apply<'a>(
  tasks: &'a [Task],
  criteria: &FilterCriteria,
  today: NaiveDate
) -> Vec<&'a Task> {
  let query =
    criteria.query.to_lowercase();
  let out: Vec<&Task> = tasks
    .iter()
    .filter(|task| {
      matches(
        task, criteria, &query, today
      )
    })
    .collect();

  trace!(
    total = tasks.len(),
    shown = out.len(),
    "applied filters"
  );
  out
}

/// `query` is the already lowercased
/// search text.
fn matches(
  task: &Task,
  criteria: &FilterCriteria,
  query: &str,
  today: NaiveDate
) -> bool {
  if !query.is_empty()
    && !task
      .title
      .to_lowercase()
      .contains(query)
    && !task
      .description
      .to_lowercase()
      .contains(query)
  {
    return false;
  }

  if let PriorityFilter::Only(p) =
    criteria.priority
    && task.priority != p
  {
    return false;
  }

  if let TagFilter::Only(tag) =
    &criteria.tag
    && !task.has_tag(tag)
  {
    return false;
  }

  criteria.due.contains(
    task.due_date,
    today
  )
}

impl DueBucket {
  /// Undated tasks only fall in `All`.
  pub fn contains(
    self,
    due: Option<NaiveDate>,
    today: NaiveDate
  ) -> bool {
    match (self, due) {
      | (DueBucket::All, _) => true,
      | (_, None) => false,
      | (DueBucket::Overdue, Some(d)) => {
        d < today
      }
      | (DueBucket::Today, Some(d)) => {
        d == today
      }
      | (DueBucket::Future, Some(d)) => {
        d > today
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | DueBucket::All => ALL,
      | DueBucket::Overdue => "overdue",
      | DueBucket::Today => "today",
      | DueBucket::Future => "future"
    }
  }
}

impl FromStr for DueBucket {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "" | ALL => Ok(DueBucket::All),
      | "overdue" => {
        Ok(DueBucket::Overdue)
      }
      | "today" => Ok(DueBucket::Today),
      | "future" => Ok(DueBucket::Future),
      | other => Err(anyhow!(
        "unknown due-date bucket: \
         {other}"
      ))
    }
  }
}

impl fmt::Display for DueBucket {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PriorityFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty()
      || trimmed.eq_ignore_ascii_case(ALL)
    {
      return Ok(PriorityFilter::All);
    }
    trimmed
      .parse::<Priority>()
      .map(PriorityFilter::Only)
  }
}

impl fmt::Display for PriorityFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | PriorityFilter::All => {
        f.write_str(ALL)
      }
      | PriorityFilter::Only(p) => {
        write!(f, "{p}")
      }
    }
  }
}

impl FromStr for TagFilter {
  type Err = std::convert::Infallible;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty()
      || trimmed == ALL
    {
      Ok(TagFilter::All)
    } else {
      Ok(TagFilter::Only(
        trimmed.to_string()
      ))
    }
  }
}

impl fmt::Display for TagFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | TagFilter::All => f.write_str(ALL),
      | TagFilter::Only(tag) => {
        f.write_str(tag)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::task::TaskId;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15)
      .expect("valid date")
  }

  fn task(
    id: u64,
    title: &str,
    tags: &[&str],
    due: Option<(i32, u32, u32)>
  ) -> Task {
    Task {
      id:          TaskId(id),
      title:       title.to_string(),
      description: String::new(),
      tags:        tags
        .iter()
        .map(|t| t.to_string())
        .collect(),
      due_date:    due.and_then(
        |(y, m, d)| {
          NaiveDate::from_ymd_opt(
            y, m, d
          )
        }
      ),
      priority:    Priority::Medium,
      done:        false
    }
  }

  fn ids(
    tasks: Vec<&Task>
  ) -> Vec<u64> {
    tasks
      .into_iter()
      .map(|t| t.id.0)
      .collect()
  }

  #[test]
  fn due_buckets_split_around_today() {
    let tasks = vec![
      task(
        1,
        "past",
        &["a"],
        Some((2024, 6, 10))
      ),
      task(
        2,
        "now",
        &["a"],
        Some((2024, 6, 15))
      ),
      task(
        3,
        "later",
        &["a"],
        Some((2024, 6, 20))
      ),
      task(4, "undated", &["a"], None),
    ];

    let bucket = |due| FilterCriteria {
      due,
      ..FilterCriteria::default()
    };

    assert_eq!(
      ids(apply(
        &tasks,
        &bucket(DueBucket::Overdue),
        today()
      )),
      vec![1]
    );
    assert_eq!(
      ids(apply(
        &tasks,
        &bucket(DueBucket::Today),
        today()
      )),
      vec![2]
    );
    assert_eq!(
      ids(apply(
        &tasks,
        &bucket(DueBucket::Future),
        today()
      )),
      vec![3]
    );
    assert_eq!(
      ids(apply(
        &tasks,
        &bucket(DueBucket::All),
        today()
      )),
      vec![1, 2, 3, 4]
    );
  }

  #[test]
  fn tag_filter_selects_exact_members() {
    let tasks = vec![
      task(1, "one", &["work"], None),
      task(2, "two", &["home"], None),
    ];
    let criteria = FilterCriteria {
      tag: TagFilter::Only(
        "home".to_string()
      ),
      ..FilterCriteria::default()
    };
    assert_eq!(
      ids(apply(
        &tasks, &criteria, today()
      )),
      vec![2]
    );
  }

  #[test]
  fn query_matches_title_or_description_case_insensitively()
   {
    let mut described =
      task(2, "Groceries", &["a"], None);
    described.description =
      "buy OAT milk".to_string();
    let tasks = vec![
      task(1, "Oat bars", &["a"], None),
      described,
      task(3, "Laundry", &["a"], None),
    ];
    let criteria = FilterCriteria {
      query: "oat".to_string(),
      ..FilterCriteria::default()
    };
    assert_eq!(
      ids(apply(
        &tasks, &criteria, today()
      )),
      vec![1, 2]
    );
  }

  #[test]
  fn criteria_combine_as_a_conjunction()
  {
    let mut high = task(
      1,
      "deploy",
      &["work"],
      Some((2024, 6, 1))
    );
    high.priority = Priority::High;
    let mut low = task(
      2,
      "deploy docs",
      &["work"],
      Some((2024, 6, 1))
    );
    low.priority = Priority::Low;
    let tasks = vec![high, low];

    let criteria = FilterCriteria {
      query:    "deploy".to_string(),
      priority: PriorityFilter::Only(
        Priority::High
      ),
      tag:      TagFilter::Only(
        "work".to_string()
      ),
      due:      DueBucket::Overdue
    };
    let first =
      ids(apply(&tasks, &criteria, today()));
    assert_eq!(first, vec![1]);
    assert_eq!(
      ids(apply(
        &tasks, &criteria, today()
      )),
      first
    );
  }

  #[test]
  fn control_values_parse_and_print() {
    assert_eq!(
      "all".parse::<PriorityFilter>()
        .expect("parse"),
      PriorityFilter::All
    );
    assert_eq!(
      "High".parse::<PriorityFilter>()
        .expect("parse"),
      PriorityFilter::Only(Priority::High)
    );
    assert!(
      "urgent"
        .parse::<PriorityFilter>()
        .is_err()
    );
    assert_eq!(
      "future"
        .parse::<DueBucket>()
        .expect("parse")
        .to_string(),
      "future"
    );
    assert_eq!(
      "home"
        .parse::<TagFilter>()
        .expect("parse"),
      TagFilter::Only("home".to_string())
    );
  }
}
