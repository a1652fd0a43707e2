pub mod lifecycle;
pub mod org;
pub mod types;


pub use lifecycle::{
    ArchiveOrganization, DeleteOrganization, RestoreOrganization, TransferOrganizationOwnership,
    ARCHIVE_ORGANIZATION, DELETE_ORGANIZATION, RESTORE_ORGANIZATION,
    TRANSFER_ORGANIZATION_OWNERSHIP,
};
pub use org::{
    CreateOrganization, ListOrganizations, UpdateOrganization, CREATE_ORGANIZATION,
    LIST_ORGANIZATIONS, UPDATE_ORGANIZATION,
};
pub use types::{
    ArchiveOrganizationInput, CreateOrganizationInput, DeleteOrganizationInput,
    ListOrganizationsInput, OrganizationList, RestoreOrganizationInput,
    TransferOrganizationOwnershipInput, UpdateOrganizationInput,
};
