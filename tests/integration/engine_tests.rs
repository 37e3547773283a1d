//! Authorization and domain-invariant engine tests against the in-memory store

use std::sync::Arc;

use rust_decimal::Decimal;

use lending_server::{
    config::AuthConfig,
    error::AppError,
    models::{
        book::CreateBook,
        library::{CreateLibrary, UpdateLibrary},
        user::{RegisterUser, UserWithRoles},
        ActionKind, AssignmentStatus, Resource, RoleName,
    },
    repository::{MemoryStore, Store},
    services::{catalog::default_grants, Services},
    AppResult,
};

const PASSWORD: &str = "secret!1";

struct World {
    store: Arc<MemoryStore>,
    services: Services,
    /// Bootstrap SUPER_ADMIN
    admin: i32,
}

impl World {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(store.clone(), AuthConfig::default());
        services.catalog.seed().await.unwrap();

        let mut world = World {
            store,
            services,
            admin: 0,
        };
        let (_, root) = world.register("root@example.org", None, None).await.unwrap();
        world.admin = root.user.id;
        world
    }

    async fn role_id(&self, name: RoleName) -> i32 {
        let mut tx = self.store.begin().await.unwrap();
        tx.ensure_role(name).await.unwrap().id
    }

    async fn register(
        &self,
        email: &str,
        role: Option<RoleName>,
        library_id: Option<i32>,
    ) -> AppResult<(String, UserWithRoles)> {
        let role_id = match role {
            Some(name) => Some(self.role_id(name).await),
            None => None,
        };
        self.services
            .auth
            .register(RegisterUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                role_id,
                library_id,
            })
            .await
    }

    /// Registered and approved identity holding exactly one role
    async fn member(&self, email: &str, role: RoleName, library_id: Option<i32>) -> i32 {
        let (_, user) = self.register(email, Some(role), library_id).await.unwrap();
        let role_id = self.role_id(role).await;
        self.services
            .assignments
            .approve(self.admin, user.user.id, role_id, library_id)
            .await
            .unwrap();
        user.user.id
    }

    async fn library(&self, name: &str) -> i32 {
        self.services
            .libraries
            .create(
                self.admin,
                CreateLibrary {
                    name: name.to_string(),
                    admin_id: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    /// Create a book as `library_admin` and stock it in its library
    async fn stocked_book(&self, library_admin: i32, library_id: i32, title: &str) -> i32 {
        let book = self
            .services
            .books
            .create(
                library_admin,
                CreateBook {
                    title: title.to_string(),
                    author_id: library_admin,
                    price: Decimal::new(1250, 2),
                    cover_url: None,
                },
            )
            .await
            .unwrap();
        self.services
            .inventory
            .add(library_admin, library_id, book.id)
            .await
            .unwrap();
        book.id
    }
}

fn all_permissions() -> impl Iterator<Item = (Resource, ActionKind)> {
    Resource::ALL
        .into_iter()
        .flat_map(|r| ActionKind::ALL.into_iter().map(move |a| (r, a)))
}

#[tokio::test]
async fn identity_without_approved_assignment_is_denied_everything() {
    let world = World::new().await;
    let library = world.library("Central").await;
    let (_, pending) = world
        .register("pending@example.org", Some(RoleName::Borrower), Some(library))
        .await
        .unwrap();
    assert_eq!(pending.roles[0].status, AssignmentStatus::Pending);

    for (resource, action) in all_permissions() {
        let allowed = world
            .services
            .permissions
            .is_allowed(pending.user.id, resource.as_str(), action)
            .await
            .unwrap();
        assert!(!allowed, "{:?} {:?} should be denied", resource, action);
    }
}

#[tokio::test]
async fn approved_role_is_allowed_exactly_its_grants() {
    let world = World::new().await;
    let library = world.library("Central").await;

    let holders = [
        (RoleName::SuperAdmin, world.admin),
        (
            RoleName::LibraryAdmin,
            world.member("la@example.org", RoleName::LibraryAdmin, Some(library)).await,
        ),
        (
            RoleName::Author,
            world.member("author@example.org", RoleName::Author, None).await,
        ),
        (
            RoleName::Borrower,
            world.member("borrower@example.org", RoleName::Borrower, Some(library)).await,
        ),
    ];

    for (role, user_id) in holders {
        let grants = default_grants(role);
        for (resource, action) in all_permissions() {
            let allowed = world
                .services
                .permissions
                .is_allowed(user_id, resource.as_str(), action)
                .await
                .unwrap();
            assert_eq!(
                allowed,
                grants.contains(&(resource, action)),
                "{} on {:?} {:?}",
                role,
                resource,
                action
            );
        }
    }
}

#[tokio::test]
async fn seeding_twice_does_not_duplicate_grants() {
    let world = World::new().await;
    world.services.catalog.seed().await.unwrap();

    let role_id = world.role_id(RoleName::LibraryAdmin).await;
    let mut tx = world.store.begin().await.unwrap();
    let permissions = tx.list_role_permissions(role_id).await.unwrap();
    assert_eq!(permissions.len(), default_grants(RoleName::LibraryAdmin).len());
}

#[tokio::test]
async fn first_identity_is_bootstrapped_as_super_admin() {
    let world = World::new().await;
    let roles = world.services.assignments.list_for_user(world.admin).await.unwrap();

    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role, RoleName::SuperAdmin);
    assert_eq!(roles[0].status, AssignmentStatus::Approved);
    assert_eq!(roles[0].library_id, None);
}

#[tokio::test]
async fn later_identities_need_a_valid_role() {
    let world = World::new().await;

    let err = world.register("norole@example.org", None, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = world
        .register("usurper@example.org", Some(RoleName::SuperAdmin), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = world
        .services
        .auth
        .register(RegisterUser {
            name: "Ghost".to_string(),
            email: "ghost@example.org".to_string(),
            password: PASSWORD.to_string(),
            role_id: Some(999),
            library_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    // Rejected registrations leave no identity behind
    let err = world
        .register("norole@example.org", Some(RoleName::Author), None)
        .await;
    assert!(err.is_ok());
}

#[tokio::test]
async fn tenant_roles_need_an_existing_library() {
    let world = World::new().await;

    let err = world
        .register("b1@example.org", Some(RoleName::Borrower), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = world
        .register("b2@example.org", Some(RoleName::Borrower), Some(4242))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let library = world.library("Central").await;
    let err = world
        .register("a1@example.org", Some(RoleName::Author), Some(library))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn email_is_unique() {
    let world = World::new().await;
    world
        .register("dup@example.org", Some(RoleName::Author), None)
        .await
        .unwrap();
    let err = world
        .register("dup@example.org", Some(RoleName::Author), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_library_admin_claims_admit_exactly_one() {
    let world = World::new().await;
    let library = world.library("Central").await;
    let first = world.member("first@example.org", RoleName::Author, None).await;
    let second = world.member("second@example.org", RoleName::Author, None).await;
    let role_id = world.role_id(RoleName::LibraryAdmin).await;

    let assignments = &world.services.assignments;
    let (a, b) = tokio::join!(
        assignments.create(first, Some(role_id), Some(library)),
        assignments.create(second, Some(role_id), Some(library)),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));
}

#[tokio::test]
async fn pending_admin_claim_blocks_a_second_claim() {
    let world = World::new().await;
    let library = world.library("Central").await;

    world
        .register("claim1@example.org", Some(RoleName::LibraryAdmin), Some(library))
        .await
        .unwrap();
    let err = world
        .register("claim2@example.org", Some(RoleName::LibraryAdmin), Some(library))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Another library is unaffected
    let other = world.library("Branch").await;
    world
        .register("claim3@example.org", Some(RoleName::LibraryAdmin), Some(other))
        .await
        .unwrap();
}

#[tokio::test]
async fn same_role_cannot_be_requested_twice() {
    let world = World::new().await;
    let author = world.member("author@example.org", RoleName::Author, None).await;
    let role_id = world.role_id(RoleName::Author).await;

    let err = world
        .services
        .assignments
        .create(author, Some(role_id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn approval_moves_pending_to_approved_once() {
    let world = World::new().await;
    let library = world.library("Central").await;
    let (_, user) = world
        .register("b@example.org", Some(RoleName::Borrower), Some(library))
        .await
        .unwrap();
    let role_id = world.role_id(RoleName::Borrower).await;
    let assignments = &world.services.assignments;

    let pending = assignments.list_pending(world.admin).await.unwrap();
    assert_eq!(pending.len(), 1);

    // Approving requires UserRole UPDATE
    let err = assignments
        .approve(user.user.id, user.user.id, role_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let approved = assignments
        .approve(world.admin, user.user.id, role_id, None)
        .await
        .unwrap();
    assert!(approved.is_approved());
    assert!(approved.modif_date.is_some());

    let err = assignments
        .approve(world.admin, user.user.id, role_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let author_role = world.role_id(RoleName::Author).await;
    let err = assignments
        .approve(world.admin, user.user.id, author_role, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(assignments.list_pending(world.admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn approval_needs_a_library_when_ambiguous() {
    let world = World::new().await;
    let central = world.library("Central").await;
    let branch = world.library("Branch").await;
    let role_id = world.role_id(RoleName::Borrower).await;

    let (_, user) = world
        .register("b@example.org", Some(RoleName::Borrower), Some(central))
        .await
        .unwrap();
    world
        .services
        .assignments
        .create(user.user.id, Some(role_id), Some(branch))
        .await
        .unwrap();

    let err = world
        .services
        .assignments
        .approve(world.admin, user.user.id, role_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let approved = world
        .services
        .assignments
        .approve(world.admin, user.user.id, role_id, Some(branch))
        .await
        .unwrap();
    assert_eq!(approved.library_id, Some(branch));
}

#[tokio::test]
async fn library_admin_guard_excludes_the_library_being_updated() {
    let world = World::new().await;
    let keeper = world.member("keeper@example.org", RoleName::Author, None).await;
    let libraries = &world.services.libraries;

    let a = libraries
        .create(
            world.admin,
            CreateLibrary {
                name: "A".to_string(),
                admin_id: Some(keeper),
            },
        )
        .await
        .unwrap();

    // Creating B with A's admin collides
    let err = libraries
        .create(
            world.admin,
            CreateLibrary {
                name: "B".to_string(),
                admin_id: Some(keeper),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Re-submitting A's own admin while updating A is fine
    let updated = libraries
        .update(
            world.admin,
            a.id,
            UpdateLibrary {
                name: Some("A renamed".to_string()),
                admin_id: Some(keeper),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "A renamed");
    assert_eq!(updated.admin_id, Some(keeper));

    let policy = &world.services.policy;
    assert!(matches!(
        policy.guard_library_admin(keeper, None).await,
        Err(AppError::Conflict(_))
    ));
    policy.guard_library_admin(keeper, Some(a.id)).await.unwrap();
    assert!(matches!(
        policy.guard_library_admin(4242, None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn library_update_keeps_unset_fields() {
    let world = World::new().await;
    let keeper = world.member("keeper@example.org", RoleName::Author, None).await;
    let library = world
        .services
        .libraries
        .create(
            world.admin,
            CreateLibrary {
                name: "Central".to_string(),
                admin_id: Some(keeper),
            },
        )
        .await
        .unwrap();

    let updated = world
        .services
        .libraries
        .update(
            world.admin,
            library.id,
            UpdateLibrary {
                name: None,
                admin_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Central");
    assert_eq!(updated.admin_id, Some(keeper));
}

#[tokio::test]
async fn only_super_admin_manages_libraries() {
    let world = World::new().await;
    let author = world.member("author@example.org", RoleName::Author, None).await;

    let err = world
        .services
        .libraries
        .create(
            author,
            CreateLibrary {
                name: "Rogue".to_string(),
                admin_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn inventory_is_restricted_to_the_library_own_admin() {
    let world = World::new().await;
    let central = world.library("Central").await;
    let branch = world.library("Branch").await;
    let central_admin = world
        .member("central@example.org", RoleName::LibraryAdmin, Some(central))
        .await;
    let book = world.stocked_book(central_admin, central, "Dune").await;

    let inventory = &world.services.inventory;
    let err = inventory.add(central_admin, branch, book).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = inventory.list(central_admin, branch).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    assert!(matches!(
        world.services.policy.guard_inventory_mutation(central_admin, branch).await,
        Err(AppError::Forbidden(_))
    ));
    world
        .services
        .policy
        .guard_inventory_mutation(central_admin, central)
        .await
        .unwrap();

    let err = inventory.add(central_admin, central, book).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = inventory.add(central_admin, central, 4242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = inventory.list(central_admin, central).await.unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].book.id, book);

    inventory.remove(central_admin, central, book).await.unwrap();
    let err = inventory.remove(central_admin, central, book).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn pending_library_admin_cannot_touch_inventory() {
    let world = World::new().await;
    let central = world.library("Central").await;
    let (_, pending) = world
        .register("pending@example.org", Some(RoleName::LibraryAdmin), Some(central))
        .await
        .unwrap();

    let err = world
        .services
        .policy
        .guard_inventory_mutation(pending.user.id, central)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn borrowing_a_book_stocked_only_elsewhere_is_forbidden() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let elsewhere = world.library("Elsewhere").await;
    let elsewhere_admin = world
        .member("admin@example.org", RoleName::LibraryAdmin, Some(elsewhere))
        .await;
    let book = world.stocked_book(elsewhere_admin, elsewhere, "Dune").await;
    let borrower = world.member("b@example.org", RoleName::Borrower, Some(home)).await;

    let err = world
        .services
        .borrows
        .borrow(borrower, book, Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn any_stocking_library_makes_a_borrow_eligible() {
    let world = World::new().await;
    let first = world.library("First").await;
    let second = world.library("Second").await;
    let first_admin = world
        .member("first@example.org", RoleName::LibraryAdmin, Some(first))
        .await;
    let second_admin = world
        .member("second@example.org", RoleName::LibraryAdmin, Some(second))
        .await;
    let book = world.stocked_book(first_admin, first, "Dune").await;
    world
        .services
        .inventory
        .add(second_admin, second, book)
        .await
        .unwrap();

    let borrower = world.member("b@example.org", RoleName::Borrower, Some(second)).await;
    world
        .services
        .borrows
        .borrow(borrower, book, Decimal::ONE)
        .await
        .unwrap();
}

#[tokio::test]
async fn borrowing_needs_a_stocked_book_and_an_approved_borrower() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let admin = world.member("admin@example.org", RoleName::LibraryAdmin, Some(home)).await;
    let book = world.stocked_book(admin, home, "Dune").await;
    world.services.inventory.remove(admin, home, book).await.unwrap();

    let borrower = world.member("b@example.org", RoleName::Borrower, Some(home)).await;
    let err = world
        .services
        .borrows
        .borrow(borrower, book, Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let (_, pending) = world
        .register("p@example.org", Some(RoleName::Borrower), Some(home))
        .await
        .unwrap();
    let err = world
        .services
        .borrows
        .borrow(pending.user.id, book, Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = world
        .services
        .borrows
        .borrow(borrower, book, Decimal::NEGATIVE_ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn borrow_return_borrow_again() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let admin = world.member("admin@example.org", RoleName::LibraryAdmin, Some(home)).await;
    let book = world.stocked_book(admin, home, "Dune").await;
    let borrower = world.member("b@example.org", RoleName::Borrower, Some(home)).await;
    let borrows = &world.services.borrows;

    let record = borrows.borrow(borrower, book, Decimal::ONE).await.unwrap();
    assert!(record.is_active());
    assert!(record.return_date.is_none());

    let err = borrows.borrow(borrower, book, Decimal::ONE).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let returned = borrows.return_book(record.id, borrower).await.unwrap();
    assert!(!returned.is_active());
    assert!(returned.return_date.is_some());

    let again = borrows.borrow(borrower, book, Decimal::ONE).await.unwrap();
    assert_ne!(again.id, record.id);

    let mine = borrows.list_mine(borrower).await.unwrap();
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn returning_a_foreign_or_returned_borrow_is_not_found() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let admin = world.member("admin@example.org", RoleName::LibraryAdmin, Some(home)).await;
    let book = world.stocked_book(admin, home, "Dune").await;
    let owner = world.member("owner@example.org", RoleName::Borrower, Some(home)).await;
    let other = world.member("other@example.org", RoleName::Borrower, Some(home)).await;
    let borrows = &world.services.borrows;

    let record = borrows.borrow(owner, book, Decimal::ONE).await.unwrap();

    let err = borrows.return_book(record.id, other).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    borrows.return_book(record.id, owner).await.unwrap();
    let err = borrows.return_book(record.id, owner).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn borrowed_book_cannot_be_deleted() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let admin = world.member("admin@example.org", RoleName::LibraryAdmin, Some(home)).await;
    let book = world.stocked_book(admin, home, "Dune").await;
    let borrower = world.member("b@example.org", RoleName::Borrower, Some(home)).await;

    let record = world
        .services
        .borrows
        .borrow(borrower, book, Decimal::ONE)
        .await
        .unwrap();

    let err = world.services.books.delete(admin, book).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    world.services.borrows.return_book(record.id, borrower).await.unwrap();
    world.services.books.delete(admin, book).await.unwrap();

    let err = world.services.books.get(admin, book).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn book_price_and_author_are_checked() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let admin = world.member("admin@example.org", RoleName::LibraryAdmin, Some(home)).await;
    let books = &world.services.books;

    let err = books
        .create(
            admin,
            CreateBook {
                title: "Free".to_string(),
                author_id: admin,
                price: Decimal::ZERO,
                cover_url: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = books
        .create(
            admin,
            CreateBook {
                title: "Orphan".to_string(),
                author_id: 4242,
                price: Decimal::ONE,
                cover_url: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_library_drops_its_scoped_assignments() {
    let world = World::new().await;
    let home = world.library("Home").await;
    let borrower = world.member("b@example.org", RoleName::Borrower, Some(home)).await;

    world.services.libraries.delete(world.admin, home).await.unwrap();

    let roles = world.services.assignments.list_for_user(borrower).await.unwrap();
    assert!(roles.is_empty());
    let err = world.services.libraries.get(world.admin, home).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn a_new_login_replaces_the_previous_session() {
    let world = World::new().await;
    let (first_token, user) = world
        .register("author@example.org", Some(RoleName::Author), None)
        .await
        .unwrap();
    let auth = &world.services.auth;

    let claims = auth.authenticate(&first_token).await.unwrap();
    assert_eq!(claims.user_id, user.user.id);

    let (second_token, _) = auth.login("author@example.org", PASSWORD).await.unwrap();
    assert_ne!(first_token, second_token);
    assert!(matches!(
        auth.authenticate(&first_token).await,
        Err(AppError::Authentication(_))
    ));
    auth.authenticate(&second_token).await.unwrap();

    auth.logout(user.user.id).await.unwrap();
    assert!(matches!(
        auth.authenticate(&second_token).await,
        Err(AppError::Authentication(_))
    ));

    assert!(matches!(
        auth.login("author@example.org", "wrong!1").await,
        Err(AppError::Authentication(_))
    ));
}
