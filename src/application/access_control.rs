//! Request-time access predicates.
//!
//! Every predicate takes the requesting principal (`None` when anonymous) and either
//! answers yes/no or yields a declarative filter on the documents the caller may see.
//! A missing principal always denies; nothing here returns an error.

use uuid::Uuid;

use crate::domain::{
    entities::{
        bookings::BookingEntity, estimates::EstimateEntity, posts::PostEntity, users::UserEntity,
    },
    value_objects::{
        access::{Access, FilterValue, Principal, QueryFilter},
        enums::{post_statuses::PostStatus, roles::Role},
    },
};

pub const STATUS_FIELD: &str = "_status";

/// Documents whose fields can be compared against a `QueryFilter`.
pub trait AccessDocument {
    fn id_field(&self, field: &str) -> Option<Uuid>;

    fn text_field(&self, _field: &str) -> Option<String> {
        None
    }
}

pub fn is_admin(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|principal| principal.has_role(Role::Admin))
}

pub fn is_host(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|principal| principal.has_role(Role::Host))
}

pub fn admin_or_customer(principal: Option<&Principal>) -> bool {
    principal.is_some_and(|principal| principal.roles.contains_any(&[Role::Admin, Role::Customer]))
}

/// Admins see everything; everyone else only documents where `field` is their own id.
pub fn admin_or_self(field: &'static str) -> impl Fn(Option<&Principal>) -> Access {
    move |principal: Option<&Principal>| match principal {
        None => Access::Denied,
        Some(principal) if principal.has_role(Role::Admin) => Access::All,
        Some(principal) => Access::Where(QueryFilter::id(field, principal.user_id)),
    }
}

/// Admins see everything; anyone else, anonymous included, only published documents.
pub fn admin_or_published(principal: Option<&Principal>) -> Access {
    if is_admin(principal) {
        Access::All
    } else {
        Access::Where(QueryFilter::text(
            STATUS_FIELD,
            PostStatus::Published.to_string(),
        ))
    }
}

pub fn is_admin_field(principal: Option<&Principal>) -> bool {
    is_admin(principal)
}

pub fn is_host_field(principal: Option<&Principal>) -> bool {
    is_host(principal)
}

/// Field-level counterpart of [`admin_or_self`]. Self access follows the same rule as the
/// record-level check: any role, as long as the document field holds the caller's id.
pub fn admin_or_self_field(
    field: &'static str,
) -> impl Fn(Option<&Principal>, &dyn AccessDocument) -> bool {
    move |principal: Option<&Principal>, document: &dyn AccessDocument| {
        permits(&admin_or_self(field)(principal), document)
    }
}

pub fn permits(access: &Access, document: &dyn AccessDocument) -> bool {
    match access {
        Access::Denied => false,
        Access::All => true,
        Access::Where(filter) => match &filter.equals {
            FilterValue::Id(id) => document.id_field(filter.field) == Some(*id),
            FilterValue::Text(value) => {
                document.text_field(filter.field).as_deref() == Some(value.as_str())
            }
        },
    }
}

/// Admins, or the host who owns the property.
pub fn can_manage_post(principal: Option<&Principal>, post: &PostEntity) -> bool {
    match principal {
        None => false,
        Some(principal) if principal.has_role(Role::Admin) => true,
        Some(principal) => {
            principal.has_role(Role::Host) && post.owner_id == Some(principal.user_id)
        }
    }
}

impl AccessDocument for BookingEntity {
    fn id_field(&self, field: &str) -> Option<Uuid> {
        match field {
            "id" => Some(self.id),
            "customer" => Some(self.customer_id),
            "post" => Some(self.post_id),
            _ => None,
        }
    }
}

impl AccessDocument for EstimateEntity {
    fn id_field(&self, field: &str) -> Option<Uuid> {
        match field {
            "id" => Some(self.id),
            "customer" => Some(self.customer_id),
            "post" => Some(self.post_id),
            _ => None,
        }
    }
}

impl AccessDocument for UserEntity {
    fn id_field(&self, field: &str) -> Option<Uuid> {
        match field {
            "id" => Some(self.id),
            _ => None,
        }
    }
}

impl AccessDocument for PostEntity {
    fn id_field(&self, field: &str) -> Option<Uuid> {
        match field {
            "id" => Some(self.id),
            "owner" => self.owner_id,
            _ => None,
        }
    }

    fn text_field(&self, field: &str) -> Option<String> {
        match field {
            STATUS_FIELD => Some(self.status.to_string()),
            "slug" => Some(self.slug.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::{
        payment_statuses::PaymentStatus, roles::RoleSet,
    };
    use chrono::Utc;

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            roles: RoleSet::new(roles.iter().copied()),
        }
    }

    fn booking_for(customer_id: Uuid) -> BookingEntity {
        let now = Utc::now();
        BookingEntity {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            customer_id,
            estimate_id: None,
            guests: Vec::new(),
            from_date: now,
            to_date: now,
            payment_status: PaymentStatus::Unpaid,
            token: "token".to_string(),
            title: "Cabin".to_string(),
            created_at: now,
        }
    }

    fn post(owner_id: Option<Uuid>, status: PostStatus) -> PostEntity {
        let now = Utc::now();
        PostEntity {
            id: Uuid::new_v4(),
            slug: "cabin".to_string(),
            title: "Cabin".to_string(),
            description: None,
            owner_id,
            status,
            base_rate: Some(150.0),
            package_settings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn anonymous_principal_is_denied_everywhere() {
        assert!(!is_admin(None));
        assert!(!is_host(None));
        assert!(!admin_or_customer(None));
        assert_eq!(admin_or_self("customer")(None), Access::Denied);
        assert!(!admin_or_self_field("customer")(None, &booking_for(Uuid::new_v4())));
    }

    #[test]
    fn anonymous_published_filter_restricts_to_published_status() {
        assert_eq!(
            admin_or_published(None),
            Access::Where(QueryFilter::text("_status", "published"))
        );
    }

    #[test]
    fn admins_see_unpublished_documents() {
        let admin = principal(&[Role::Admin]);
        let draft = post(None, PostStatus::Draft);

        assert_eq!(admin_or_published(Some(&admin)), Access::All);
        assert!(permits(&admin_or_published(Some(&admin)), &draft));
        assert!(!permits(&admin_or_published(None), &draft));
        assert!(permits(
            &admin_or_published(None),
            &post(None, PostStatus::Published)
        ));
    }

    #[test]
    fn self_filter_never_matches_another_users_document() {
        for roles in [
            vec![Role::Guest],
            vec![Role::Customer],
            vec![Role::Host],
            vec![Role::Customer, Role::Host],
        ] {
            let caller = principal(&roles);
            let access = admin_or_self("customer")(Some(&caller));

            assert_eq!(access, Access::Where(QueryFilter::id("customer", caller.user_id)));
            assert!(!permits(&access, &booking_for(Uuid::new_v4())));
            assert!(permits(&access, &booking_for(caller.user_id)));
        }
    }

    #[test]
    fn field_level_self_access_matches_record_level() {
        let guest = principal(&[Role::Guest]);
        let own = booking_for(guest.user_id);
        let foreign = booking_for(Uuid::new_v4());
        let check = admin_or_self_field("customer");

        assert!(check(Some(&guest), &own));
        assert!(!check(Some(&guest), &foreign));
        assert!(check(Some(&principal(&[Role::Admin])), &foreign));
    }

    #[test]
    fn unknown_filter_fields_deny() {
        let caller = principal(&[Role::Customer]);
        let access = admin_or_self("owner")(Some(&caller));

        assert!(!permits(&access, &booking_for(caller.user_id)));
    }

    #[test]
    fn role_predicates() {
        assert!(is_admin_field(Some(&principal(&[Role::Admin]))));
        assert!(is_host_field(Some(&principal(&[Role::Host]))));
        assert!(admin_or_customer(Some(&principal(&[Role::Customer]))));
        assert!(admin_or_customer(Some(&principal(&[Role::Admin]))));
        assert!(!admin_or_customer(Some(&principal(&[Role::Guest, Role::Host]))));
    }

    #[test]
    fn only_owning_hosts_and_admins_manage_posts() {
        let host = principal(&[Role::Host]);
        let other_host = principal(&[Role::Host]);
        let customer = principal(&[Role::Customer]);
        let owned = post(Some(host.user_id), PostStatus::Published);

        assert!(can_manage_post(Some(&host), &owned));
        assert!(!can_manage_post(Some(&other_host), &owned));
        assert!(!can_manage_post(Some(&customer), &post(Some(customer.user_id), PostStatus::Draft)));
        assert!(can_manage_post(Some(&principal(&[Role::Admin])), &owned));
        assert!(!can_manage_post(None, &owned));
    }
}
