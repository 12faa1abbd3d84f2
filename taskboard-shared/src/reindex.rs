/// Dense task position maintenance
///
/// Within a project, the positions of `n` tasks are always exactly
/// `0..n`. Moving a task is split into a pure plan and its application:
///
/// 1. clamp the requested position into `[0, n-1]`
/// 2. if it equals the current position, nothing happens
/// 3. park the moving task past the highest occupied position
/// 4. shift the tasks between old and new position by one
///    - moving up (`new < old`): `[new, old)` each `+1`
///    - moving down (`new > old`): `(old, new]` each `-1`
/// 5. write the new position
///
/// Removing a task shifts every later position down by one so no gap is
/// left behind.
///
/// All steps run inside the caller's transaction; a failure anywhere rolls
/// the whole move back.
///
/// # Example
///
/// ```
/// use taskboard_shared::reindex::{plan_move, MovePlan, PositionRange, Shift};
///
/// // Five tasks, move the one at 4 to the top
/// let plan = plan_move(5, 4, 0);
/// assert_eq!(
///     plan,
///     MovePlan::Move {
///         from: 4,
///         to: 0,
///         parking: 5,
///         shift: Shift { range: PositionRange::new(0, 3), delta: 1 },
///     }
/// );
///
/// // Out-of-range requests are clamped
/// assert_eq!(plan_move(3, 0, 99).target(), 2);
/// ```

use tracing::debug;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::models::task::Task;
use crate::store::StoreTx;

/// Inclusive range of positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub start: i32,
    pub end: i32,
}

impl PositionRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: i32) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Bulk position adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub range: PositionRange,
    pub delta: i32,
}

/// Steps needed to move one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// The clamped target equals the current position
    Unchanged { position: i32 },

    /// Park at `parking`, apply `shift` to the others, then land on `to`
    Move {
        from: i32,
        to: i32,
        parking: i32,
        shift: Shift,
    },
}

impl MovePlan {
    /// Position the task ends up at
    pub fn target(&self) -> i32 {
        match self {
            MovePlan::Unchanged { position } => *position,
            MovePlan::Move { to, .. } => *to,
        }
    }
}

fn to_position(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Clamps a requested position into `[0, count-1]`
pub fn clamp_target(count: i64, requested: i64) -> i32 {
    if count <= 0 {
        return 0;
    }
    to_position(requested.clamp(0, count - 1))
}

/// Plans moving the task at `current` to `requested` among `count` tasks
pub fn plan_move(count: i64, current: i32, requested: i64) -> MovePlan {
    let target = clamp_target(count, requested);

    if target == current {
        return MovePlan::Unchanged { position: current };
    }

    let shift = if target < current {
        Shift {
            range: PositionRange::new(target, current - 1),
            delta: 1,
        }
    } else {
        Shift {
            range: PositionRange::new(current + 1, target),
            delta: -1,
        }
    };

    MovePlan::Move {
        from: current,
        to: target,
        parking: to_position(count),
        shift,
    }
}

/// Plans closing the gap left by removing the task at `removed`
///
/// `count` is the number of tasks before removal. Returns `None` when the
/// removed task was last.
pub fn plan_removal(count: i64, removed: i32) -> Option<Shift> {
    let last = to_position(count - 1);

    if removed >= last {
        return None;
    }

    Some(Shift {
        range: PositionRange::new(removed + 1, last),
        delta: -1,
    })
}

/// Executes a move plan inside a transaction
///
/// Returns the task's final position.
pub async fn apply_move<T: StoreTx>(
    tx: &mut T,
    project_id: Uuid,
    task_id: Uuid,
    plan: &MovePlan,
) -> ServiceResult<i32> {
    let MovePlan::Move {
        to, parking, shift, ..
    } = *plan
    else {
        return Ok(plan.target());
    };

    tx.set_position(task_id, parking).await?;
    tx.shift_positions(project_id, shift.range, shift.delta, task_id)
        .await?;
    tx.set_position(task_id, to).await?;

    Ok(to)
}

/// Moves `task` to `requested`, clamped, keeping its project dense
pub async fn move_task<T: StoreTx>(tx: &mut T, task: &Task, requested: i64) -> ServiceResult<i32> {
    let count = tx.count_tasks(task.project_id).await?;
    let mut plan = plan_move(count, task.position, requested);

    // Park above the highest occupied slot even if positions have a gap
    if let MovePlan::Move { parking, .. } = &mut plan {
        if let Some(max) = tx.max_position(task.project_id).await? {
            *parking = (*parking).max(max + 1);
        }
    }

    debug!(
        task_id = %task.id,
        from = task.position,
        requested,
        to = plan.target(),
        "Repositioning task"
    );

    apply_move(tx, task.project_id, task.id, &plan).await
}

/// Deletes `task` and shifts every later task in its project up by one
pub async fn remove_task<T: StoreTx>(tx: &mut T, task: &Task) -> ServiceResult<bool> {
    let count = tx.count_tasks(task.project_id).await?;

    if !tx.delete_task(task.id).await? {
        return Ok(false);
    }

    if let Some(shift) = plan_removal(count, task.position) {
        tx.shift_positions(task.project_id, shift.range, shift.delta, task.id)
            .await?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::NewProject;
    use crate::models::task::{NewTask, TaskStatus};
    use crate::store::{FailPoint, MemoryStore, Store};

    #[test]
    fn test_plan_unchanged() {
        assert_eq!(plan_move(5, 2, 2), MovePlan::Unchanged { position: 2 });
    }

    #[test]
    fn test_plan_move_up() {
        let plan = plan_move(5, 3, 1);
        assert_eq!(
            plan,
            MovePlan::Move {
                from: 3,
                to: 1,
                parking: 5,
                shift: Shift { range: PositionRange::new(1, 2), delta: 1 },
            }
        );
    }

    #[test]
    fn test_plan_move_down() {
        let plan = plan_move(5, 1, 3);
        assert_eq!(
            plan,
            MovePlan::Move {
                from: 1,
                to: 3,
                parking: 5,
                shift: Shift { range: PositionRange::new(2, 3), delta: -1 },
            }
        );
    }

    #[test]
    fn test_clamp_target() {
        assert_eq!(clamp_target(3, -5), 0);
        assert_eq!(clamp_target(3, 99), 2);
        assert_eq!(clamp_target(3, 1), 1);
        assert_eq!(clamp_target(0, 4), 0);
        assert_eq!(clamp_target(1, i64::MAX), 0);
    }

    #[test]
    fn test_clamped_request_to_own_position_is_noop() {
        // Last task asked to move past the end
        assert_eq!(plan_move(3, 2, 10), MovePlan::Unchanged { position: 2 });
        // First task asked to move below zero
        assert_eq!(plan_move(3, 0, -1), MovePlan::Unchanged { position: 0 });
    }

    #[test]
    fn test_plan_removal() {
        assert_eq!(
            plan_removal(4, 1),
            Some(Shift { range: PositionRange::new(2, 3), delta: -1 })
        );
        assert_eq!(plan_removal(4, 3), None);
        assert_eq!(plan_removal(1, 0), None);
    }

    #[test]
    fn test_range_contains() {
        let range = PositionRange::new(2, 4);
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(1));
        assert!(!range.contains(5));
    }

    async fn seed(store: &MemoryStore, count: i32) -> (Uuid, Vec<Task>) {
        let mut tx = store.begin().await.unwrap();
        let project = tx
            .insert_project(NewProject {
                name: "Reindex".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for position in 0..count {
            let task = tx
                .insert_task(NewTask {
                    project_id: project.id,
                    position,
                    title: format!("T{}", position),
                    description: None,
                    status: TaskStatus::Todo,
                })
                .await
                .unwrap();
            tasks.push(task);
        }
        tx.commit().await.unwrap();

        (project.id, tasks)
    }

    async fn titles(store: &MemoryStore, project_id: Uuid) -> Vec<String> {
        let mut tx = store.begin().await.unwrap();
        let tasks = tx.list_all_tasks(project_id).await.unwrap();
        for (index, task) in tasks.iter().enumerate() {
            assert_eq!(task.position, index as i32);
        }
        tasks.into_iter().map(|t| t.title).collect()
    }

    #[tokio::test]
    async fn test_every_move_keeps_positions_dense() {
        for count in 1..=5 {
            for from in 0..count {
                for requested in -2..(count as i64 + 2) {
                    let store = MemoryStore::new();
                    let (project_id, tasks) = seed(&store, count).await;
                    let subject = &tasks[from as usize];

                    let mut tx = store.begin().await.unwrap();
                    let landed = move_task(&mut tx, subject, requested).await.unwrap();
                    tx.commit().await.unwrap();

                    let expected_target = requested.clamp(0, count as i64 - 1) as i32;
                    assert_eq!(landed, expected_target);

                    let mut expected: Vec<String> =
                        tasks.iter().map(|t| t.title.clone()).collect();
                    let moved = expected.remove(from as usize);
                    expected.insert(expected_target as usize, moved);

                    assert_eq!(titles(&store, project_id).await, expected);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_remove_compacts_later_positions() {
        let store = MemoryStore::new();
        let (project_id, tasks) = seed(&store, 4).await;

        let mut tx = store.begin().await.unwrap();
        assert!(remove_task(&mut tx, &tasks[1]).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(titles(&store, project_id).await, vec!["T0", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_move_parks_above_a_gap() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let project = tx
            .insert_project(NewProject {
                name: "Gapped".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for position in [0, 1, 3] {
            let task = tx
                .insert_task(NewTask {
                    project_id: project.id,
                    position,
                    title: format!("T{}", position),
                    description: None,
                    status: TaskStatus::Todo,
                })
                .await
                .unwrap();
            tasks.push(task);
        }

        // Parking at the task count would collide with the task at 3
        assert_eq!(move_task(&mut tx, &tasks[0], 1).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let placed: Vec<(String, i32)> = tx
            .list_all_tasks(project.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.title, t.position))
            .collect();
        assert_eq!(
            placed,
            vec![
                ("T1".to_string(), 0),
                ("T0".to_string(), 1),
                ("T3".to_string(), 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_shift_rolls_back_move() {
        let store = MemoryStore::new();
        let (project_id, tasks) = seed(&store, 3).await;

        store.fail_next(FailPoint::ShiftPositions).await;
        let mut tx = store.begin().await.unwrap();
        assert!(move_task(&mut tx, &tasks[2], 0).await.is_err());
        drop(tx);

        assert_eq!(titles(&store, project_id).await, vec!["T0", "T1", "T2"]);
    }
}
