use super::ActionStatus;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{NewTestimonial, Testimonial, TestimonialStatistics, TestimonialStatus};
use crate::validation::AttachmentSet;

/// Public and caller-scoped testimonials plus moderation actions.
///
/// Moderation replies carry the updated record; it replaces the cached copy
/// in `own` and `current` so the cache never disagrees with the server.
#[derive(Debug, Clone, Default)]
pub struct TestimonialStore {
    /// Public listing.
    pub testimonials: Vec<Testimonial>,
    /// Testimonials visible to the logged-in user.
    pub own: Vec<Testimonial>,
    pub current: Option<Testimonial>,
    pub statistics: Vec<TestimonialStatistics>,
    pub status: ActionStatus,
}

impl TestimonialStore {
    pub fn clear_own(&mut self) {
        self.own.clear();
        self.current = None;
        self.statistics.clear();
    }

    fn replace(&mut self, updated: &Testimonial) {
        if let Some(slot) = self.own.iter_mut().find(|t| t.id.is_some() && t.id == updated.id) {
            *slot = updated.clone();
        }
        if self.current.as_ref().is_some_and(|t| t.id == updated.id) {
            self.current = Some(updated.clone());
        }
    }

    pub fn fetch_public<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[Testimonial], ApiError> {
        self.testimonials = self.status.run("fetch_testimonials", || api.list_testimonials())?;
        Ok(&self.testimonials)
    }

    pub fn fetch_own<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[Testimonial], ApiError> {
        self.own = self.status.run("fetch_own_testimonials", || api.list_own_testimonials())?;
        Ok(&self.own)
    }

    pub fn fetch_one<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
    ) -> Result<Testimonial, ApiError> {
        let testimonial = self.status.run("fetch_testimonial", || api.get_own_testimonial(id))?;
        self.current = Some(testimonial.clone());
        Ok(testimonial)
    }

    pub fn fetch_statistics<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[TestimonialStatistics], ApiError> {
        self.statistics = self.status.run("fetch_statistics", || api.testimonial_statistics())?;
        Ok(&self.statistics)
    }

    pub fn create<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        input: &NewTestimonial,
        attachments: &AttachmentSet,
    ) -> Result<Testimonial, ApiError> {
        let created = self
            .status
            .run("create_testimonial", || api.create_testimonial(input, attachments))?;
        self.own.push(created.clone());
        Ok(created)
    }

    pub fn approve<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
    ) -> Result<Testimonial, ApiError> {
        let updated = self.status.run("approve_testimonial", || api.approve_testimonial(id))?;
        self.replace(&updated);
        Ok(updated)
    }

    pub fn reject<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
        feedback: &str,
    ) -> Result<Testimonial, ApiError> {
        let updated = self
            .status
            .run("reject_testimonial", || api.reject_testimonial(id, feedback))?;
        self.replace(&updated);
        Ok(updated)
    }

    pub fn change_status<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
        status: TestimonialStatus,
        feedback: Option<&str>,
    ) -> Result<Testimonial, ApiError> {
        let updated = self
            .status
            .run("change_status", || api.change_status(id, status, feedback))?;
        self.replace(&updated);
        Ok(updated)
    }

    pub fn add_feedback<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
        feedback: &str,
    ) -> Result<Testimonial, ApiError> {
        let updated = self.status.run("add_feedback", || api.add_feedback(id, feedback))?;
        self.replace(&updated);
        Ok(updated)
    }

    pub fn delete<T: Transport, S: SessionStorage>(&mut self, api: &ApiClient<T, S>, id: u64) -> Result<(), ApiError> {
        self.status.run("delete_testimonial", || api.delete_testimonial(id))?;
        self.own.retain(|t| t.id != Some(id));
        if self.current.as_ref().is_some_and(|t| t.id == Some(id)) {
            self.current = None;
        }
        Ok(())
    }
}
