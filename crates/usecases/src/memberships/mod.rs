pub mod invitation;
pub mod member;
pub mod types;


pub use invitation::{
    AcceptOrganizationInvitation, AddOrganizationMember, ACCEPT_ORGANIZATION_INVITATION,
    ADD_ORGANIZATION_MEMBER,
};
pub use member::{
    LeaveOrganization, ListOrganizationMembers, RemoveOrganizationMember,
    UpdateOrganizationMemberRole, LEAVE_ORGANIZATION, LIST_ORGANIZATION_MEMBERS,
    REMOVE_ORGANIZATION_MEMBER, UPDATE_ORGANIZATION_MEMBER_ROLE,
};
pub use types::{
    AcceptOrganizationInvitationInput, AddOrganizationMemberInput, LeaveOrganizationInput,
    ListOrganizationMembersInput, OrganizationMemberList, RemoveOrganizationMemberInput,
    UpdateOrganizationMemberRoleInput,
};
