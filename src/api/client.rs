use anyhow::{Context, Result};
use reqwest::{header, Client};

use super::types::*;
use crate::config::Config;
use crate::schedule::Section;

/// Client for the course data service (`/api/courses`)
pub struct CourseClient {
    client: Client,
    courses_url: String,
    year: String,
    term: String,
    campus: String,
}

impl CourseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            courses_url: config.courses_url(),
            year: config.year.to_string(),
            term: config.term.to_string(),
            campus: config.campus.clone(),
        })
    }

    fn query_url(&self, search: &str) -> String {
        format!(
            "{}?year={}&term={}&campus={}&search={}",
            self.courses_url,
            urlencoding::encode(&self.year),
            urlencoding::encode(&self.term),
            urlencoding::encode(&self.campus),
            urlencoding::encode(search)
        )
    }

    async fn get_courses(&self, search: &str) -> Result<CoursesResponse> {
        let url = self.query_url(search);
        log::debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.courses_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }

        let result = response
            .json::<CoursesResponse>()
            .await
            .context("Failed to parse course data")?;

        if result.status != "success" {
            anyhow::bail!(
                "Course service error: {}",
                result.message.as_deref().unwrap_or(&result.status)
            );
        }
        Ok(result)
    }

    /// Courses matching a free text query, for the search panel
    pub async fn search_courses(&self, query: &str) -> Result<Vec<ApiCourse>> {
        let response = self.get_courses(query.trim()).await?;
        log::info!("Search \"{}\" returned {} courses", query, response.data.len());
        Ok(response.data)
    }

    /// Every section of one course, in the internal shape
    pub async fn fetch_sections(&self, course_string: &str) -> Result<Vec<Section>> {
        let response = self.get_courses(course_string).await?;
        let sections = sections_for_course(response, course_string);
        log::info!("Fetched {} sections for {}", sections.len(), course_string);
        Ok(sections)
    }
}
