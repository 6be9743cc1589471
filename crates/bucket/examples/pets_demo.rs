//! Pets Demo - Functional Coverage End to End
//!
//! Builds a small coverage model of dogs and their chew toys, samples a few
//! dogs into two independent runs, then merges and summarises the readings.
//!
//! # Running
//!
//! ```bash
//! cargo run --example pets_demo -p bucket
//! RUST_LOG=bucket=debug cargo run --example pets_demo -p bucket
//! ```

#![allow(clippy::uninlined_format_args)]

use bucket::axis_utils::{self, OneHotOptions};
use bucket::{
    summarize, AxisValues, Bucket, BucketResult, BucketView, Children, CoverConfig, CoverTop,
    CoverageContext, Covergroup, Coverpoint, Goal, GoalSet, MemoryArchive, PointDefinition,
    PointReader, PointSetup, RawValue, Reader, Writer,
};

struct Dog {
    name: &'static str,
    age: i64,
    weight: i64,
    leg: i64,
    toys: &'static [&'static str],
}

struct DogStats;

impl PointDefinition<Dog> for DogStats {
    fn setup(&mut self, setup: &mut PointSetup, ctx: &CoverageContext) -> BucketResult<()> {
        let names = ctx
            .get::<Vec<&'static str>>("pet_names")
            .cloned()
            .unwrap_or_default();
        setup.add_axis("name", names, "All the acceptable dog names")?;
        setup.add_axis("age", (0..16).collect::<Vec<i64>>(), "Dog age in years")?;
        setup.add_axis(
            "size",
            AxisValues::named([
                ("Small", RawValue::range(0, 10)),
                ("medium", RawValue::range(11, 30)),
                ("large", RawValue::range(31, 50)),
            ]),
            "Rough size estimate from weight",
        )?;
        setup.add_goal("HECKIN_CHONKY", -1, "Puppies can't be this big!")
    }

    fn apply_goals<'g>(&self, bucket: &BucketView<'_>, goals: &'g GoalSet) -> Option<&'g Goal> {
        let puppy = bucket
            .get("age")
            .and_then(|age| age.parse::<i64>().ok())
            .is_some_and(|age| age <= 1);
        (puppy && bucket.is("size", "large"))
            .then(|| goals.get("HECKIN_CHONKY"))
            .flatten()
    }

    fn sample(&mut self, bucket: &mut Bucket<'_>, dog: &Dog) -> BucketResult<()> {
        bucket
            .set("name", dog.name)?
            .set("age", dog.age)?
            .set("size", dog.weight)?;
        bucket.hit()
    }
}

struct ChewToys;

impl PointDefinition<Dog> for ChewToys {
    fn setup(&mut self, setup: &mut PointSetup, _: &CoverageContext) -> BucketResult<()> {
        setup.add_axis("age", vec!["Puppy", "Adult", "Senior"], "Range of dog years")?;
        setup.add_axis(
            "favourite_leg",
            axis_utils::one_hot(4, OneHotOptions::default())?,
            "Favourite leg",
        )?;
        setup.add_axis(
            "favourite_toy",
            vec!["Slipper", "Ball", "Stick", "Ring"],
            "Types of dog toys",
        )?;
        setup.add_goal("NO_SLIPPERS", -1, "Only puppies chew slippers!")?;
        setup.add_goal("STICK", 50, "Yay sticks!")
    }

    fn apply_goals<'g>(&self, bucket: &BucketView<'_>, goals: &'g GoalSet) -> Option<&'g Goal> {
        if !bucket.is("age", "Puppy") && bucket.is("favourite_toy", "Slipper") {
            goals.get("NO_SLIPPERS")
        } else if bucket.is("favourite_toy", "Stick") {
            goals.get("STICK")
        } else {
            None
        }
    }

    fn sample(&mut self, bucket: &mut Bucket<'_>, dog: &Dog) -> BucketResult<()> {
        let age = match dog.age {
            a if a < 2 => "Puppy",
            a if a > 12 => "Senior",
            _ => "Adult",
        };
        bucket.set("age", age)?.set("favourite_leg", dog.leg)?;
        for toy in dog.toys {
            bucket.set("favourite_toy", *toy)?;
            bucket.hit()?;
        }
        Ok(())
    }
}

fn build(ctx: &CoverageContext) -> BucketResult<CoverTop<Dog>> {
    let toys = |children: &mut Children<Dog>, ctx: &CoverageContext| -> BucketResult<()> {
        children.add_coverpoint(
            Coverpoint::new("chew_toys", "Chew toys by age and leg", ChewToys, ctx)?
                .with_tier(2)
                .with_tags(["toys"]),
        )
    };
    let dogs = move |children: &mut Children<Dog>, ctx: &CoverageContext| -> BucketResult<()> {
        children.add_coverpoint(
            Coverpoint::new("dog_stats", "Basic stats for all dogs", DogStats, ctx)?
                .with_tier(0)
                .with_tags(["basic"]),
        )?;
        children.add_covergroup(Covergroup::new("toys", "Dogs and their toys", toys, ctx)?)
    };
    let root = Covergroup::new("dogs", "Doggy coverage", dogs, ctx)?;
    Ok(CoverTop::new(root, CoverConfig::default()))
}

fn run(ctx: &CoverageContext, dogs: &[Dog]) -> BucketResult<CoverTop<Dog>> {
    let mut top = build(ctx)?;
    for dog in dogs {
        top.sample(dog)?;
    }
    Ok(top)
}

fn main() -> BucketResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucket=info".into()),
        )
        .init();

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║                 BUCKET FUNCTIONAL COVERAGE DEMO               ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    let ctx = CoverageContext::new().with("pet_names", vec!["Clive", "Barbara", "Ethel"]);

    let monday = [
        Dog { name: "Clive", age: 0, weight: 4, leg: 1, toys: &["Slipper", "Ball"] },
        Dog { name: "Barbara", age: 6, weight: 22, leg: 4, toys: &["Stick"] },
    ];
    let tuesday = [
        Dog { name: "Ethel", age: 14, weight: 35, leg: 8, toys: &["Ring", "Stick"] },
        Dog { name: "Barbara", age: 6, weight: 22, leg: 4, toys: &["Stick", "Ball"] },
    ];

    // Model
    let top = build(&ctx)?;
    println!("Coverage tree:\n{}", top.tree());

    // Two runs of the same model
    let reader = PointReader::new("pets-demo");
    let mut archive = MemoryArchive::new();
    for (day, dogs) in [("monday", &monday[..]), ("tuesday", &tuesday[..])] {
        let top = run(&ctx, dogs)?;
        let record = archive.write(&reader.read(&top))?;
        println!("  {:<8} -> record {}", day, record.0);
    }

    // Merge and summarise
    let Some(merged) = archive.merge_all()? else {
        return Ok(());
    };
    println!("\nMerged coverage ({} buckets):", merged.bucket_hits.len());
    for summary in summarize(&merged) {
        println!("  {}", summary);
    }

    println!("\nJSON size: {} bytes", merged.to_json()?.len());
    Ok(())
}
