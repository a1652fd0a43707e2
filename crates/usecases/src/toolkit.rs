use tenantkit_core::{Adapters, HookRegistry, PersistenceAdapter};

use crate::memberships::{
    AcceptOrganizationInvitation, AddOrganizationMember, LeaveOrganization,
    ListOrganizationMembers, RemoveOrganizationMember, UpdateOrganizationMemberRole,
};
use crate::organizations::{
    ArchiveOrganization, CreateOrganization, DeleteOrganization, ListOrganizations,
    RestoreOrganization, TransferOrganizationOwnership, UpdateOrganization,
};
use crate::users::{CreateUser, DeleteUser, UpdateUser};

/// One constructed instance of every use case, sharing a single adapter
/// bundle and hook registry.
///
/// Hook bundles are resolved per use case at construction; registering
/// hooks after building the toolkit has no effect on it.
pub struct Toolkit<P: PersistenceAdapter> {
    pub create_user: CreateUser<P>,
    pub update_user: UpdateUser<P>,
    pub delete_user: DeleteUser<P>,

    pub create_organization: CreateOrganization<P>,
    pub update_organization: UpdateOrganization<P>,
    pub list_organizations: ListOrganizations<P>,
    pub archive_organization: ArchiveOrganization<P>,
    pub restore_organization: RestoreOrganization<P>,
    pub delete_organization: DeleteOrganization<P>,
    pub transfer_organization_ownership: TransferOrganizationOwnership<P>,

    pub add_organization_member: AddOrganizationMember<P>,
    pub accept_organization_invitation: AcceptOrganizationInvitation<P>,
    pub leave_organization: LeaveOrganization<P>,
    pub remove_organization_member: RemoveOrganizationMember<P>,
    pub update_organization_member_role: UpdateOrganizationMemberRole<P>,
    pub list_organization_members: ListOrganizationMembers<P>,
}

impl<P: PersistenceAdapter> Toolkit<P> {
    pub fn new(adapters: Adapters<P>, hooks: HookRegistry) -> Self {
        Self {
            create_user: CreateUser::new(adapters.clone(), &hooks),
            update_user: UpdateUser::new(adapters.clone(), &hooks),
            delete_user: DeleteUser::new(adapters.clone(), &hooks),

            create_organization: CreateOrganization::new(adapters.clone(), &hooks),
            update_organization: UpdateOrganization::new(adapters.clone(), &hooks),
            list_organizations: ListOrganizations::new(adapters.clone(), &hooks),
            archive_organization: ArchiveOrganization::new(adapters.clone(), &hooks),
            restore_organization: RestoreOrganization::new(adapters.clone(), &hooks),
            delete_organization: DeleteOrganization::new(adapters.clone(), &hooks),
            transfer_organization_ownership: TransferOrganizationOwnership::new(
                adapters.clone(),
                &hooks,
            ),

            add_organization_member: AddOrganizationMember::new(adapters.clone(), &hooks),
            accept_organization_invitation: AcceptOrganizationInvitation::new(
                adapters.clone(),
                &hooks,
            ),
            leave_organization: LeaveOrganization::new(adapters.clone(), &hooks),
            remove_organization_member: RemoveOrganizationMember::new(adapters.clone(), &hooks),
            update_organization_member_role: UpdateOrganizationMemberRole::new(
                adapters.clone(),
                &hooks,
            ),
            list_organization_members: ListOrganizationMembers::new(adapters, &hooks),
        }
    }
}
