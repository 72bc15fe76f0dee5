//! Tasks v1 REST handle.

use serde::Deserialize;
use tracing::debug;

use crate::api::{BoxFuture, TasksApi};
use crate::error::ProviderResult;
use crate::resources::{Task, TaskList, TaskQuery};

use super::http::{send_empty, send_json};

/// Base URL for Google Tasks API v1.
pub const TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Tasks handle bound to one access token.
#[derive(Debug, Clone)]
pub struct GoogleTasks {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleTasks {
    pub fn new(http_client: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            base_url: TASKS_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn tasks_url(&self, task_list_id: &str) -> String {
        format!(
            "{}/lists/{}/tasks",
            self.base_url,
            urlencoding::encode(task_list_id)
        )
    }

    fn task_url(&self, task_list_id: &str, task_id: &str) -> String {
        format!(
            "{}/{}",
            self.tasks_url(task_list_id),
            urlencoding::encode(task_id)
        )
    }

    async fn fetch_task_lists(&self, max_results: u32) -> ProviderResult<Vec<TaskList>> {
        let request = self
            .http_client
            .get(format!("{}/users/@me/lists", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("maxResults", max_results.to_string())]);
        let list: ListResponse<TaskList> = send_json(request).await?;
        debug!("listed {} task lists", list.items.len());
        Ok(list.items)
    }

    async fn fetch_tasks(&self, query: &TaskQuery) -> ProviderResult<Vec<Task>> {
        let mut params = vec![
            ("maxResults", query.max_results.to_string()),
            ("showCompleted", query.show_completed.to_string()),
            ("showHidden", query.show_hidden.to_string()),
        ];
        if let Some(due_min) = &query.due_min {
            params.push(("dueMin", due_min.clone()));
        }
        if let Some(due_max) = &query.due_max {
            params.push(("dueMax", due_max.clone()));
        }

        let request = self
            .http_client
            .get(self.tasks_url(&query.task_list_id))
            .bearer_auth(&self.access_token)
            .query(&params);
        let list: ListResponse<Task> = send_json(request).await?;
        debug!(
            "fetched {} tasks from list {}",
            list.items.len(),
            query.task_list_id
        );
        Ok(list.items)
    }

    async fn fetch_task(&self, task_list_id: &str, task_id: &str) -> ProviderResult<Task> {
        send_json(
            self.http_client
                .get(self.task_url(task_list_id, task_id))
                .bearer_auth(&self.access_token),
        )
        .await
    }

    async fn create_task(
        &self,
        task_list_id: &str,
        task: &Task,
        parent: Option<&str>,
    ) -> ProviderResult<Task> {
        let mut request = self
            .http_client
            .post(self.tasks_url(task_list_id))
            .bearer_auth(&self.access_token)
            .json(task);
        if let Some(parent) = parent {
            request = request.query(&[("parent", parent)]);
        }
        send_json(request).await
    }

    async fn replace_task(
        &self,
        task_list_id: &str,
        task_id: &str,
        task: &Task,
    ) -> ProviderResult<Task> {
        send_json(
            self.http_client
                .put(self.task_url(task_list_id, task_id))
                .bearer_auth(&self.access_token)
                .json(task),
        )
        .await
    }

    async fn remove_task(&self, task_list_id: &str, task_id: &str) -> ProviderResult<()> {
        send_empty(
            self.http_client
                .delete(self.task_url(task_list_id, task_id))
                .bearer_auth(&self.access_token),
        )
        .await
    }
}

impl TasksApi for GoogleTasks {
    fn list_task_lists(&self, max_results: u32) -> BoxFuture<'_, ProviderResult<Vec<TaskList>>> {
        Box::pin(self.fetch_task_lists(max_results))
    }

    fn list_tasks<'a>(&'a self, query: &'a TaskQuery) -> BoxFuture<'a, ProviderResult<Vec<Task>>> {
        Box::pin(self.fetch_tasks(query))
    }

    fn get_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        Box::pin(self.fetch_task(task_list_id, task_id))
    }

    fn insert_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task: &'a Task,
        parent: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        Box::pin(self.create_task(task_list_id, task, parent))
    }

    fn update_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
        task: &'a Task,
    ) -> BoxFuture<'a, ProviderResult<Task>> {
        Box::pin(self.replace_task(task_list_id, task_id, task))
    }

    fn delete_task<'a>(
        &'a self,
        task_list_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.remove_task(task_list_id, task_id))
    }
}
