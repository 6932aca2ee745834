use super::ActionStatus;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{Organization, Testimonial};

#[derive(Debug, Clone, Default)]
pub struct OrganizationStore {
    pub organizations: Vec<Organization>,
    /// Approved testimonials of the organization last asked for.
    pub approved: Vec<Testimonial>,
    pub status: ActionStatus,
}

impl OrganizationStore {
    pub fn fetch_organizations<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[Organization], ApiError> {
        self.organizations = self.status.run("fetch_organizations", || api.list_organizations())?;
        Ok(&self.organizations)
    }

    pub fn fetch_approved<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        organization_id: u64,
    ) -> Result<&[Testimonial], ApiError> {
        self.approved = self
            .status
            .run("fetch_approved_testimonials", || api.approved_testimonials(organization_id))?;
        Ok(&self.approved)
    }
}
