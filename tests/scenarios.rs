// End-to-end scenarios through the public API on a file-backed database

use gym_records::{
    BcryptHasher, Database, Gym, GymError, MembershipPlan, Role, Session, MIN_BCRYPT_COST,
};

fn open_gym(dir: &tempfile::TempDir) -> Gym {
    let db = Database::open(&dir.path().join("gym.db")).unwrap();
    Gym::new(db, BcryptHasher::new(MIN_BCRYPT_COST))
}

#[test]
fn test_member_registration_and_login() {
    let dir = tempfile::tempdir().unwrap();
    let gym = open_gym(&dir);

    let alice = gym
        .register("alice", "pw1", "a@x.com", "555", "addr", "MEMBER")
        .unwrap();
    assert_eq!(alice.id, 1);
    assert_eq!(alice.role, Role::Member);

    assert!(matches!(
        gym.login("alice", "wrong"),
        Err(GymError::InvalidCredentials)
    ));

    let session = gym.login("alice", "pw1").unwrap();
    assert_eq!(session.user().unwrap().account_id(), 1);

    assert!(matches!(
        gym.register("alice", "pw2", "b@x.com", "556", "addr", "TRAINER"),
        Err(GymError::DuplicateUsername(_))
    ));
}

#[test]
fn test_trainer_class_ownership() {
    let dir = tempfile::tempdir().unwrap();
    let gym = open_gym(&dir);

    gym.register("tom", "pw", "t@x.com", "555", "addr", "TRAINER").unwrap();
    gym.register("tina", "pw", "t2@x.com", "555", "addr", "TRAINER").unwrap();
    let tom = gym.login("tom", "pw").unwrap();
    let tina = gym.login("tina", "pw").unwrap();

    let class = gym.create_class(&tom, "Yoga", "relax").unwrap();
    assert_eq!(class.trainer_id, tom.user().unwrap().account_id());

    assert!(matches!(
        gym.update_class(&tina, class.id, "Yoga", "mine now"),
        Err(GymError::Unauthorized(_))
    ));
    assert!(matches!(
        gym.delete_class(&tina, class.id),
        Err(GymError::Unauthorized(_))
    ));
    assert!(gym.delete_class(&tom, class.id).unwrap());
}

#[test]
fn test_revenue_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let gym = open_gym(&dir);
        gym.register("alice", "pw", "a@x.com", "555", "addr", "MEMBER").unwrap();
        gym.register("bob", "pw", "b@x.com", "555", "addr", "MEMBER").unwrap();

        let alice = gym.login("alice", "pw").unwrap();
        let bob = gym.login("bob", "pw").unwrap();
        gym.purchase_membership(&alice, MembershipPlan::Monthly).unwrap();
        gym.purchase_membership(&bob, MembershipPlan::Annual).unwrap();
    }

    let gym = open_gym(&dir);
    gym.accounts()
        .register("root", "pw", "r@x.com", "555", "addr", "ADMIN")
        .unwrap();
    let admin = gym.login("root", "pw").unwrap();

    assert_eq!(gym.total_revenue(&admin).unwrap(), 550.0);
    assert_eq!(gym.list_accounts(&admin).unwrap().len(), 3);

    let admin_id = admin.user().unwrap().account_id();
    assert!(matches!(
        gym.delete_account(&admin, admin_id),
        Err(GymError::Forbidden(_))
    ));

    let admin = admin.logout();
    assert_eq!(admin, Session::Anonymous);
    assert!(matches!(
        gym.total_revenue(&admin),
        Err(GymError::Unauthorized(_))
    ));
}
