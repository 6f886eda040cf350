//! Thin bindings over the `/tasks` REST endpoints

use reqwest::Client;
use taskdeck_auth::fetch::{endpoint, Fetch, FetchError};
use taskdeck_auth::CLIENT_INFO;

use crate::models::{NewTask, Task, TaskUpdate};

/// Stateless access to the task endpoints; every call carries the caller's token
#[derive(Clone)]
pub struct TasksApi {
    base_url: String,
    http_client: Client,
}

impl TasksApi {
    pub fn new(base_url: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            http_client,
        }
    }

    fn tasks_url(&self) -> String {
        endpoint(&self.base_url, "/tasks")
    }

    fn task_url(&self, id: i64) -> String {
        endpoint(&self.base_url, &format!("/tasks/{}", id))
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Task>, FetchError> {
        Fetch::get(&self.http_client, &self.tasks_url())
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .execute::<Vec<Task>>()
            .await
    }

    pub async fn get(&self, token: &str, id: i64) -> Result<Task, FetchError> {
        Fetch::get(&self.http_client, &self.task_url(id))
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .execute::<Task>()
            .await
    }

    pub async fn create(&self, token: &str, task: &NewTask) -> Result<Task, FetchError> {
        Fetch::post(&self.http_client, &self.tasks_url())
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .json(task)?
            .execute::<Task>()
            .await
    }

    /// `PUT /tasks/{id}`, also the route used to change completion
    pub async fn update(
        &self,
        token: &str,
        id: i64,
        update: &TaskUpdate,
    ) -> Result<Task, FetchError> {
        Fetch::put(&self.http_client, &self.task_url(id))
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .json(update)?
            .execute::<Task>()
            .await
    }

    pub async fn delete(&self, token: &str, id: i64) -> Result<(), FetchError> {
        Fetch::delete(&self.http_client, &self.task_url(id))
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .execute_empty()
            .await
    }
}
