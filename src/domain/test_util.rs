use crate::domain::task::{TaskPriority, TaskStatus};
use crate::domain::user::{Role, User, UserCredentials};
use crate::domain::work_update::Intensity;
use crate::domain::UserRef;
use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::RwLock;

/// Connectivity represents the "connected" state of a mocked driven port and provides
/// common behavior for returning an error if the port is configured to be in a disconnected state.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// FakeImplementation is a quick drop-in property that helps mock a function and capture
/// arguments the function is called with. It's useful for mocking async functions since
/// popular rust mocking tools don't work well with async functions on traits.
///
/// * [Args] represents the arguments passed to the function that should be captured on a call
/// * [Ret] represents the type of the function's return value
///
/// # Example
///
/// This data structure can be used in mock trait implementations like so:
///
/// ```
/// use domain::test_util::FakeImplementation;
/// use std::sync::Mutex;
///
/// trait MyAsyncTrait {
///   async fn some_cool_function(&self, var_1: i32, var_2: i32) -> String;
/// }
///
/// struct FakeTraitImplementation {
///   // The generics are (i32, i32) for captured arguments and String for the return value
///   some_cool_function_result: FakeImplementation<(i32, i32), String>;
/// }
///
/// impl MyAsyncTrait for Mutex<FakeTraitImplementation> {
///   async fn some_cool_function(&self, var_1: i32, var_2: i32) -> String {
///     // We have to lock "self" so we can mutate the interior via an immutable reference
///     let mut self_locked = self.lock().unwrap();
///     
///     // Capture the arguments of this invocation
///     self_locked.save_arguments((var_1, var_2));
///
///     // Return the configured return value
///     self_locked.return_value()
///   }
/// }
/// ```
///
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    /// Creates a new FakeImplementation
    pub fn new() -> FakeImplementation<Args, Ret> {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    /// Saves arguments from a single invocation of the FakeImplementation
    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments)
    }

    /// Returns the list of arguments passed on every call to this FakeImplementation
    pub fn calls(&self) -> &[Args] {
        self.saved_arguments.as_slice()
    }
}

#[allow(dead_code)]
impl<Args, Ret> FakeImplementation<Args, Ret>
where
    Ret: Clone,
{
    /// Set the value that should be returned when this FakeImplementation is invoked
    pub fn set_return_value(&mut self, return_value: Ret) {
        self.return_value = Some(return_value)
    }

    /// Retrieve the configured return value for this FakeImplementation
    pub fn return_value(&self) -> Ret {
        match self.return_value {
            None => panic!("Tried to return from a function where the return value wasn't set!"),
            Some(ref ret_val) => ret_val.clone(),
        }
    }
}

impl<Args, Success, Fail> FakeImplementation<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// [Result] does not implement [Clone], so this function can be used when the contained values
    /// can be cloned.
    pub fn set_returned_result(&mut self, return_value: Result<Success, Fail>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(err)),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked (for [Result]s)
    pub fn return_value_result(&self) -> Result<Success, Fail> {
        match self.return_value {
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(err.clone()),
            None => panic!("Tried to return from a function where the return value wasn't set!"),
        }
    }
}

impl<Args, Success> FakeImplementation<Args, anyhow::Result<Success>>
where
    Success: Clone,
{
    /// Set the result that should be returned when this FakeImplementation is invoked.
    /// This is used in a special case for [anyhow::Result], since [anyhow::Error] does not
    /// implement [Clone].
    pub fn set_returned_anyhow(&mut self, return_value: anyhow::Result<Success>) {
        match return_value {
            Ok(ok_result) => self.return_value = Some(Ok(ok_result)),
            Err(err) => self.return_value = Some(Err(anyhow!(format!("{}", err)))),
        }
    }

    /// Retrieve the result that should be returned when this FakeImplementation is invoked (for [anyhow::Result]s)
    pub fn return_value_anyhow(&self) -> anyhow::Result<Success> {
        match self.return_value {
            None => panic!("Tried to return from a function where the value wasn't set!"),
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(anyhow!(format!("{}", err))),
        }
    }
}

/// A task as the in-memory store keeps it, with raw user IDs instead of resolved names
#[derive(Clone, Debug)]
pub struct StoredTask {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub manager_id: i32,
    pub assignee_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A work update as the in-memory store keeps it
#[derive(Clone, Debug)]
pub struct StoredWorkUpdate {
    pub id: i32,
    pub task_id: i32,
    pub author_id: i32,
    pub update_text: String,
    pub percentage_complete: i32,
    pub intensity: Intensity,
    pub manager_remark: String,
    pub is_acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory stand-in for the whole database. Each domain module implements its driven ports
/// for `RwLock<InMemoryStore>` in its own `test_util` module so services can be tested without
/// PostgreSQL. Timestamps come from a fake clock that advances one second per write, which
/// keeps "newest first" orderings deterministic.
pub struct InMemoryStore {
    pub users: Vec<UserCredentials>,
    pub tasks: Vec<StoredTask>,
    pub updates: Vec<StoredWorkUpdate>,
    pub connectivity: Connectivity,
    clock_ticks: i64,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            users: Vec::new(),
            tasks: Vec::new(),
            updates: Vec::new(),
            connectivity: Connectivity::Connected,
            clock_ticks: 0,
        }
    }

    pub fn new_locked() -> RwLock<InMemoryStore> {
        RwLock::new(InMemoryStore::new())
    }

    /// Returns a fresh timestamp, later than every timestamp handed out before it
    pub fn tick(&mut self) -> DateTime<Utc> {
        self.clock_ticks += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.clock_ticks)
    }

    /// Adds a user whose password hash is produced by [crate::domain::auth::test_util::FakePasswordHasher]
    /// for the password "password123"
    pub fn add_user(&mut self, name: &str, role: Role) -> i32 {
        let id = self.users.len() as i32 + 1;
        let created_at = self.tick();
        self.users.push(UserCredentials {
            user: User {
                id,
                name: name.to_owned(),
                email: format!("{}@example.com", name.to_lowercase()),
                role,
                created_at,
            },
            password_hash: "hashed:password123".to_owned(),
        });

        id
    }

    pub fn add_task(
        &mut self,
        title: &str,
        manager_id: i32,
        assignee_id: Option<i32>,
        status: TaskStatus,
    ) -> i32 {
        let id = self.tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
        let now = self.tick();
        self.tasks.push(StoredTask {
            id,
            title: title.to_owned(),
            description: None,
            status,
            priority: None,
            manager_id,
            assignee_id,
            due_date: None,
            created_at: now,
            updated_at: now,
        });

        id
    }

    pub fn add_update(&mut self, task_id: i32, author_id: i32, percentage_complete: i32) -> i32 {
        let id = self.updates.iter().map(|update| update.id).max().unwrap_or(0) + 1;
        let now = self.tick();
        self.updates.push(StoredWorkUpdate {
            id,
            task_id,
            author_id,
            update_text: format!("Progress note {id}"),
            percentage_complete,
            intensity: Intensity::Medium,
            manager_remark: String::new(),
            is_acknowledged: false,
            created_at: now,
            updated_at: now,
        });

        id
    }

    /// Resolves a user ID to its display name the way a SQL join would
    pub fn user_ref(&self, id: i32) -> UserRef {
        let name = self
            .users
            .iter()
            .find(|creds| creds.user.id == id)
            .map(|creds| creds.user.name.clone())
            .unwrap_or_default();

        UserRef { id, name }
    }
}
